//! Request handlers for the server side of a connection.
//!
//! A handler receives one fully read request, its body already de-framed, and
//! produces a response whose optional [`Payload`] is framed by the connection.
//! Returning an error makes the connection answer `500 Internal Server Error`.

use async_trait::async_trait;
use bytes::Bytes;
use std::error::Error;

use http::{Request, Response};

use crate::protocol::Payload;

#[async_trait]
pub trait Handler: Send + Sync {
    type Error: Into<Box<dyn Error + Send + Sync>>;

    async fn call(&self, req: Request<Option<Bytes>>) -> Result<Response<Option<Payload>>, Self::Error>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<Err, F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request<Option<Bytes>>) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Fut: Future<Output = Result<Response<Option<Payload>>, Err>> + Send,
{
    type Error = Err;

    async fn call(&self, req: Request<Option<Bytes>>) -> Result<Response<Option<Payload>>, Self::Error> {
        (self.f)(req).await
    }
}

pub fn make_handler<F, Err, Ret>(f: F) -> HandlerFn<F>
where
    Err: Into<Box<dyn Error + Send + Sync>>,
    Ret: Future<Output = Result<Response<Option<Payload>>, Err>>,
    F: Fn(Request<Option<Bytes>>) -> Ret,
{
    HandlerFn { f }
}
