pub mod amqp;
pub mod http;
