//! Login, signup, and logout flows.
//!
//! These flows are the only writers of the session file; every other screen
//! consumes the typed [`SessionState`] it produces. The backend owns
//! credential validation and email verification; this side just reports
//! what it said.

mod ui;

pub use ui::{confirm, prompt_line, prompt_password, UiError};

use crate::api::{ApiClient, LoginRequest, SignupRequest};
use crate::core::session::{clear_session, Session};

pub async fn login(api: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔑 Botline Login");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    let email = prompt_line("Email: ")?;
    if email.is_empty() {
        return Err(UiError::new("Email cannot be empty").into());
    }
    let password = prompt_password("Password: ")?;

    let response = api.login(&LoginRequest { email, password }).await?;

    let session = Session {
        user_id: response.user_id,
        full_name: response.full_name,
    };
    session.save()?;

    println!();
    println!("✅ Logged in as {}", session.full_name);
    Ok(())
}

pub async fn signup(api: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    println!("📝 Botline Signup");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    let full_name = prompt_line("Full name: ")?;
    if full_name.is_empty() {
        return Err(UiError::new("Full name cannot be empty").into());
    }
    let email = prompt_line("Email: ")?;
    if email.is_empty() {
        return Err(UiError::new("Email cannot be empty").into());
    }
    let password = prompt_password("Password: ")?;
    let confirm_password = prompt_password("Confirm password: ")?;
    if password != confirm_password {
        return Err(UiError::new("Passwords do not match").into());
    }

    let ack = api
        .signup(&SignupRequest {
            full_name,
            email,
            password,
            confirm_password,
        })
        .await?;

    println!();
    match ack.message {
        Some(message) => println!("✅ {message}"),
        None => println!("✅ Signup submitted. Check your email, then run 'botline login'."),
    }
    Ok(())
}

pub fn logout() -> Result<(), Box<dyn std::error::Error>> {
    clear_session()?;
    println!("👋 Logged out.");
    Ok(())
}
