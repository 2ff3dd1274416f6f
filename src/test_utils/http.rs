use axum::Router;
use tokio::net::TcpListener;

/// Serve `router` on a free local port, returning its base URL.
pub(crate) async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Could not bind a local port");
    let address = listener.local_addr().expect("Could not get local address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server stopped unexpectedly")
    });

    format!("http://{address}")
}
