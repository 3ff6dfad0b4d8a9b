pub mod chat;
pub mod config;
pub mod conversation;
pub mod error;
pub mod loan;
pub mod mortgage;
pub mod session;

// Re-export main types for convenience
pub use chat::{ChatClient, ChatMessage, ChatRequest, ChatResponse, ChatRole, HealthStatus};
pub use config::{ClientConfig, Config};
pub use conversation::Conversation;
pub use error::{ApiError, ErrorCode};
pub use loan::{ApplicantSummary, LoanApplication, LoanApplicationClient, LoanError};
pub use mortgage::{
    calculate_mortgage, format_currency, validate_mortgage_inputs, Amortization, Currency,
    InputIssue, MortgageInputs, MortgageResults,
};
pub use session::{
    generate_session_id, get_or_create_session_id, FileSessionStore, MemorySessionStore,
    SessionStore,
};
