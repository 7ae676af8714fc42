pub mod analysis;
pub mod recompute;
pub mod scheduler;
pub mod seeding;
pub mod server;
pub mod submissions;
