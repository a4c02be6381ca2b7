use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes one prepared request. Implementations may decorate the request
/// (credentials, headers) before handing it to an inner transport.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Box<C> {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        (**self).execute(req).await
    }
}
