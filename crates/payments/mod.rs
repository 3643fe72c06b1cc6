pub mod gateway_error;
pub mod paypal_client;
pub mod stripe_client;
