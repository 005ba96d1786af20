mod forwarder;

pub use forwarder::HttpForwarder;
