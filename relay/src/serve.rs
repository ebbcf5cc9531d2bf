use axum::Router;
use if_addrs::get_if_addrs;
use std::net::{IpAddr, SocketAddr};
use tokio::net::{TcpListener, ToSocketAddrs};

use crate::routing::UPLOAD_PATH;

/// Serve `router` until Ctrl-C or SIGTERM, letting in-flight submissions finish.
pub async fn serve<S: ToSocketAddrs>(addr: S, router: Router) -> std::io::Result<()> {
    let tcp_listener = TcpListener::bind(addr).await?;
    print_listener_urls(&tcp_listener);

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("server stopped");
    Ok(())
}

fn print_listener_urls(listener: &TcpListener) {
    let addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            log::warn!("could not determine the listening address: {e}");
            return;
        }
    };

    let port = addr.port();
    log::info!("accepting submissions on port {port}");
    match addr {
        SocketAddr::V4(addr4) if addr4.ip().is_unspecified() => {
            for ip in get_interface_ips(false) {
                print_addr(ip, port)
            }
        }
        SocketAddr::V6(addr6) if addr6.ip().is_unspecified() => {
            for ip in get_interface_ips(true) {
                print_addr(ip, port)
            }
        }
        _ => print_addr(addr.ip(), port),
    }
}

fn get_interface_ips(ipv6: bool) -> Vec<IpAddr> {
    get_if_addrs()
        .into_iter()
        .flatten()
        .map(|i| i.ip())
        .filter(|ip| ip.is_ipv6() == ipv6)
        .collect()
}

fn print_addr(addr: IpAddr, port: u16) {
    match addr {
        _ if addr.is_loopback() => log::info!("➜  Local:   http://localhost:{port}{UPLOAD_PATH}"),
        IpAddr::V4(_) => log::info!("➜  Network: http://{addr}:{port}{UPLOAD_PATH}"),
        IpAddr::V6(_) => log::info!("➜  Network: http://[{addr}]:{port}{UPLOAD_PATH}"),
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("shutting down, finishing in-flight requests");
}
