// Submission API: templates and jobs are created here and picked up by the scheduler

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
