//! Typed adapters for individual Connector API operations.
//!
//! Each adapter borrows the client and maps one operation path onto
//! [`MewsClient::call`](crate::MewsClient::call). Operations without an
//! adapter can be reached through `call` directly.

/// Implements [`Authenticatable`](crate::Authenticatable) for a request type
/// with a `base: BaseRequest` field.
macro_rules! authenticatable {
    ($($request:ty),+ $(,)?) => {
        $(
            impl $crate::Authenticatable for $request {
                fn base_request(&self) -> &$crate::BaseRequest {
                    &self.base
                }

                fn base_request_mut(&mut self) -> &mut $crate::BaseRequest {
                    &mut self.base
                }
            }
        )+
    };
}

pub mod bills;
pub mod common;
pub mod configuration;
pub mod customers;

pub use bills::Bills;
pub use configuration::Configuration;
pub use customers::Customers;
