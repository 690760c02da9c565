pub mod discovery;
pub mod introspection;
pub mod verifier;
