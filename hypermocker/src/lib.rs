//! HTTP server for tests, which answers only the requests it was told to anticipate, and only
//! when the test decides to.

use http_body_util::Full;
use hyper::{
    HeaderMap, Request, Response, body::Incoming, server::conn::http1, service::Service,
};
use hyper_util::rt::TokioIo;
use std::{
    collections::HashMap,
    future::Future,
    net::SocketAddr,
    pin::Pin,
    sync::{Arc, Mutex},
};
use tokio::{
    net::TcpListener,
    sync::oneshot,
    task::JoinHandle,
};

pub use hyper;
pub use hyper::StatusCode;
pub use hyper::body::Bytes;

type Reply = oneshot::Sender<Response<Full<Bytes>>>;
type Arrival = (Request<()>, Reply);

#[derive(Default)]
struct State {
    /// Requests announced by [`Server::anticipate`], which did not come yet.
    anticipated: HashMap<String, oneshot::Sender<Arrival>>,

    unexpected: Vec<String>,
}

pub struct Server {
    port: u16,
    state: Arc<Mutex<State>>,
    acceptor: JoinHandle<()>,
}

impl Server {
    /// Create new [`Server`], and bind it to a random port.
    pub async fn bind() -> Self {
        let state = Arc::new(Mutex::new(State::default()));

        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        log::info!("Listening on {port}.");

        let acceptor = tokio::spawn({
            let state = Arc::clone(&state);
            async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        continue;
                    };
                    let io = TokioIo::new(stream);

                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        if let Err(e) = http1::Builder::new()
                            .serve_connection(io, AnticipatingService { state })
                            .await
                        {
                            log::debug!("Connection ended with: {e}");
                        }
                    });
                }
            }
        });

        Self {
            port,
            state,
            acceptor,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Announce that a request for `path` is going to come.
    pub fn anticipate(&self, path: impl Into<String>) -> AnticipatedRequest {
        let path = path.into();
        log::info!("Anticipating '{path}'.");
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().anticipated.insert(path, tx);
        AnticipatedRequest {
            arrival: Progress::Waiting(rx),
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.acceptor.abort();

        if std::thread::panicking() {
            return;
        }

        if let Ok(state) = self.state.lock() {
            assert!(
                state.unexpected.is_empty(),
                "there are unexpected requests: {:?}",
                state.unexpected
            );
        }
    }
}

enum Progress {
    Waiting(oneshot::Receiver<Arrival>),
    Arrived(Arrival),
}

/// Request announced by [`Server::anticipate`].
pub struct AnticipatedRequest {
    arrival: Progress,
}

impl AnticipatedRequest {
    /// Wait for the request to come.
    pub async fn expect(&mut self) -> &Request<()> {
        if let Progress::Waiting(rx) = &mut self.arrival {
            let arrival = rx.await.expect("server is gone");
            log::info!("'{}' arrived.", arrival.0.uri());
            self.arrival = Progress::Arrived(arrival);
        }

        match &self.arrival {
            Progress::Arrived((request, _)) => request,
            Progress::Waiting(_) => unreachable!(),
        }
    }

    /// Wait for the request and respond with 200 and `payload`.
    pub async fn respond(self, payload: impl Into<Bytes>) {
        self.reply(Response::new(Full::new(payload.into()))).await;
    }

    /// Wait for the request and respond with 200, `headers` and `payload`.
    pub async fn respond_with_headers(self, headers: HeaderMap, payload: impl Into<Bytes>) {
        let mut response = Response::new(Full::new(payload.into()));
        *response.headers_mut() = headers;
        self.reply(response).await;
    }

    /// Wait for the request and respond with given status and an empty body.
    pub async fn respond_with_status(self, status: StatusCode) {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        self.reply(response).await;
    }

    async fn reply(mut self, response: Response<Full<Bytes>>) {
        self.expect().await;
        if let Progress::Arrived((request, reply)) = self.arrival {
            log::info!("Responding to '{}' with {}.", request.uri(), response.status());
            let _ = reply.send(response);
        }
    }
}

struct AnticipatingService {
    state: Arc<Mutex<State>>,
}

impl Service<Request<Incoming>> for AnticipatingService {
    type Response = Response<Full<Bytes>>;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, request: Request<Incoming>) -> Self::Future {
        log::info!("Incoming request '{}'.", request.uri());
        let state = Arc::clone(&self.state);

        Box::pin(async move {
            let path = request.uri().path().to_owned();
            let anticipated = state.lock().unwrap().anticipated.remove(&path);

            let Some(tx) = anticipated else {
                log::warn!("Unexpected '{}'.", request.uri());
                state.lock().unwrap().unexpected.push(request.uri().to_string());
                let mut response = Response::new(Full::new(Bytes::from_static(b"unexpected")));
                *response.status_mut() = StatusCode::IM_A_TEAPOT;
                return Ok(response);
            };

            let (parts, _) = request.into_parts();
            let (reply_tx, reply_rx) = oneshot::channel();
            let _ = tx.send((Request::from_parts(parts, ()), reply_tx));

            Ok(reply_rx.await.unwrap_or_else(|_| {
                log::warn!("'{path}' was anticipated, but never responded to.");
                let mut response = Response::new(Full::new(Bytes::new()));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            }))
        })
    }
}
