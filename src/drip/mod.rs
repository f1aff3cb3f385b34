pub mod handlers;
pub mod job;
pub mod repo;

pub use handlers::router;

/// Nurture sequence enrolled once per purchasing client.
pub const CLIENT_WELCOME: &str = "client_welcome";

#[derive(Debug, Clone, Copy)]
pub struct DripStep {
    pub template: &'static str,
    /// Days to wait after the previous step before this one is due.
    pub delay_days: i32,
}

pub fn steps_for(sequence: &str) -> &'static [DripStep] {
    match sequence {
        CLIENT_WELCOME => &[
            DripStep {
                template: "client_welcome",
                delay_days: 0,
            },
            DripStep {
                template: "gallery_tips",
                delay_days: 3,
            },
            DripStep {
                template: "print_offer",
                delay_days: 7,
            },
        ],
        _ => &[],
    }
}
