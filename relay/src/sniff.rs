//! Content-type detection from leading bytes.
//!
//! Declared content types and filename extensions come from the client and are
//! never consulted; only the magic numbers at the start of the file count.

/// Bytes read from each attachment before sniffing. The farthest signature in the
/// table is the tar header magic at offset 257.
pub const SNIFF_LEN: usize = 261;

/// Reports the MIME type of a byte prefix, or `None` when nothing matches.
pub trait Sniffer: Send + Sync + 'static {
    fn sniff(&self, head: &[u8]) -> Option<&'static str>;
}

struct Signature {
    mime: &'static str,
    matches: fn(&[u8]) -> bool,
}

fn at(buf: &[u8], offset: usize, magic: &[u8]) -> bool {
    buf.get(offset..offset + magic.len()) == Some(magic)
}

fn ftyp_brand(buf: &[u8], brands: &[&[u8; 4]]) -> bool {
    at(buf, 4, b"ftyp") && brands.iter().any(|brand| at(buf, 8, *brand))
}

fn is_matroska(buf: &[u8]) -> bool {
    at(buf, 0, &[0x1A, 0x45, 0xDF, 0xA3])
}

// the doctype element sits somewhere in the EBML header
fn is_webm(buf: &[u8]) -> bool {
    let header = &buf[..buf.len().min(64)];
    is_matroska(buf) && header.windows(4).any(|w| w == b"webm")
}

const SIGNATURES: &[Signature] = &[
    // images
    Signature {
        mime: "image/jpeg",
        matches: |b| at(b, 0, &[0xFF, 0xD8, 0xFF]),
    },
    Signature {
        mime: "image/png",
        matches: |b| at(b, 0, &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
    },
    Signature {
        mime: "image/gif",
        matches: |b| at(b, 0, b"GIF87a") || at(b, 0, b"GIF89a"),
    },
    Signature {
        mime: "image/webp",
        matches: |b| at(b, 0, b"RIFF") && at(b, 8, b"WEBP"),
    },
    Signature {
        mime: "image/bmp",
        matches: |b| at(b, 0, b"BM"),
    },
    Signature {
        mime: "image/tiff",
        matches: |b| at(b, 0, b"II*\0") || at(b, 0, b"MM\0*"),
    },
    Signature {
        mime: "image/vnd.microsoft.icon",
        matches: |b| at(b, 0, &[0x00, 0x00, 0x01, 0x00]),
    },
    Signature {
        mime: "image/vnd.adobe.photoshop",
        matches: |b| at(b, 0, b"8BPS"),
    },
    Signature {
        mime: "image/avif",
        matches: |b| ftyp_brand(b, &[b"avif", b"avis"]),
    },
    Signature {
        mime: "image/heic",
        matches: |b| ftyp_brand(b, &[b"heic", b"heix", b"hevc", b"hevx"]),
    },
    Signature {
        mime: "image/heif",
        matches: |b| ftyp_brand(b, &[b"mif1", b"msf1"]),
    },
    // video
    Signature {
        mime: "video/mp4",
        matches: |b| {
            ftyp_brand(
                b,
                &[b"isom", b"iso2", b"mp41", b"mp42", b"avc1", b"dash", b"M4V "],
            )
        },
    },
    Signature {
        mime: "video/quicktime",
        matches: |b| ftyp_brand(b, &[b"qt  "]),
    },
    Signature {
        mime: "video/webm",
        matches: is_webm,
    },
    Signature {
        mime: "video/x-matroska",
        matches: is_matroska,
    },
    // audio
    Signature {
        mime: "audio/mpeg",
        matches: |b| {
            at(b, 0, b"ID3")
                || at(b, 0, &[0xFF, 0xFB])
                || at(b, 0, &[0xFF, 0xF3])
                || at(b, 0, &[0xFF, 0xF2])
        },
    },
    Signature {
        mime: "audio/ogg",
        matches: |b| at(b, 0, b"OggS"),
    },
    Signature {
        mime: "audio/x-flac",
        matches: |b| at(b, 0, b"fLaC"),
    },
    Signature {
        mime: "audio/x-wav",
        matches: |b| at(b, 0, b"RIFF") && at(b, 8, b"WAVE"),
    },
    // documents
    Signature {
        mime: "application/pdf",
        matches: |b| at(b, 0, b"%PDF"),
    },
    Signature {
        mime: "application/rtf",
        matches: |b| at(b, 0, br"{\rtf"),
    },
    // archives
    Signature {
        mime: "application/zip",
        matches: |b| {
            at(b, 0, b"PK\x03\x04") || at(b, 0, b"PK\x05\x06") || at(b, 0, b"PK\x07\x08")
        },
    },
    Signature {
        mime: "application/gzip",
        matches: |b| at(b, 0, &[0x1F, 0x8B, 0x08]),
    },
    Signature {
        mime: "application/x-bzip2",
        matches: |b| at(b, 0, b"BZh"),
    },
    Signature {
        mime: "application/x-7z-compressed",
        matches: |b| at(b, 0, &[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C]),
    },
    Signature {
        mime: "application/vnd.rar",
        matches: |b| at(b, 0, b"Rar!\x1A\x07"),
    },
    Signature {
        mime: "application/x-tar",
        matches: |b| at(b, 257, b"usta"),
    },
    // executables
    Signature {
        mime: "application/x-executable",
        matches: |b| at(b, 0, b"\x7FELF"),
    },
    Signature {
        mime: "application/vnd.microsoft.portable-executable",
        matches: |b| at(b, 0, b"MZ"),
    },
    Signature {
        mime: "application/wasm",
        matches: |b| at(b, 0, b"\0asm"),
    },
];

/// [`Sniffer`] over a fixed table of magic numbers. The first match wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSniffer;

impl Sniffer for MagicSniffer {
    fn sniff(&self, head: &[u8]) -> Option<&'static str> {
        SIGNATURES
            .iter()
            .find(|signature| (signature.matches)(head))
            .map(|signature| signature.mime)
    }
}
