pub mod daemon;
pub mod files;
pub mod health;
pub mod init;
pub mod login;
pub mod redeem;
pub mod token;
pub mod upload;
pub mod version;

pub use daemon::Daemon;
pub use files::Files;
pub use health::Health;
pub use init::Init;
pub use login::Login;
pub use redeem::Redeem;
pub use token::Token;
pub use upload::Upload;
pub use version::Version;
