pub mod functions;
pub mod response;
