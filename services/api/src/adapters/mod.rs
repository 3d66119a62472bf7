pub mod db;
pub mod resend;
pub mod ultravox;

pub use db::DbAdapter;
pub use resend::ResendAdapter;
pub use ultravox::UltravoxAdapter;
