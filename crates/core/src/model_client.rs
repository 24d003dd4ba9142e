use std::pin::Pin;
use std::sync::Arc;

use mathbot_model::{
    ModelCompletion, ModelProvider, ModelProviderError, ModelRequest,
};
use tracing::Instrument;

type SendRequestResult = Result<ModelCompletion, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that provides a type-erased
/// interface for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since the relay is shared across
        // request handlers that don't know about the provider type.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    match fut.await {
                        Ok(completion) => {
                            trace!("finished a request");
                            Ok(completion)
                        }
                        Err(err) => {
                            error!("got an error: {err:?}");
                            Err(Box::new(err) as Box<dyn ModelProviderError>)
                        }
                    }
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and waits for the completion.
    #[inline]
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        (self.handler_fn)(req).await
    }
}
