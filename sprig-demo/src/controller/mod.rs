// Controllers served by the demo application

pub mod users;
