//! Handler trait and type erasure.
//!
//! # How registered functions are stored
//!
//! [`Cloud`](crate::Cloud) holds user code of many different closure types
//! in a few `HashMap`s. Rust collections hold one concrete type, so each
//! handler is hidden behind a trait object (`dyn ErasedHandler<Args, T>`)
//! keyed only by what it takes and what it returns.
//!
//! ```text
//! async fn hello(req: FunctionRequest) -> Result<Value, FunctionError>  ← user writes this
//!        ↓ cloud.define("hello", hello)
//! hello.into_boxed_handler()                    ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(hello))                    ← stored as BoxedHandler<Args, T>
//!        ↓
//! handler.call(args) at request time            ← one vtable dispatch
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::FunctionError;

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future resolving to the handler's result.
///
/// `Send + 'static` so tokio can move it between worker threads.
pub(crate) type BoxFuture<T> =
    Pin<Box<dyn Future<Output = Result<T, FunctionError>> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler<Args, T> {
    fn call(&self, args: Args) -> BoxFuture<T>;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler<Args, T> = Arc<dyn ErasedHandler<Args, T> + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid function or hook.
///
/// You never implement this yourself. It is satisfied by any `async fn` or
/// closure of the shape
///
/// ```text
/// async fn name(args: Args) -> Result<T, FunctionError>
/// ```
///
/// where `Args` and `T` depend on what is being registered (see
/// [`Cloud`](crate::Cloud)). The trait is sealed.
pub trait Handler<Args, T>: private::Sealed<Args, T> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler<Args, T>;
}

mod private {
    pub trait Sealed<Args, T> {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, Args, T> private::Sealed<Args, T> for F
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FunctionError>> + Send + 'static,
{
}

impl<F, Fut, Args, T> Handler<Args, T> for F
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FunctionError>> + Send + 'static,
    Args: 'static,
    T: 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler<Args, T> {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Bridges a concrete handler `F` into the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, Args, T> ErasedHandler<Args, T> for FnHandler<F>
where
    F: Fn(Args) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, FunctionError>> + Send + 'static,
{
    fn call(&self, args: Args) -> BoxFuture<T> {
        Box::pin((self.0)(args))
    }
}
