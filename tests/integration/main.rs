//! Integration tests: HTTP route binding, the batched client against a mock
//! peer, and the two sides talking to each other.

mod end_to_end;
mod mock_server;
mod server;
