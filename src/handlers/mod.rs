// Public handlers need no token; protected ones run behind JWT authentication
// and the route policy guard.
pub mod protected;
pub mod public;
