/// Dispatches the email verification link.
///
/// TODO: wire up a real mail provider; until then the link is only logged,
/// matching local development behavior.
pub async fn send_verification_email(base_url: &str, email: &str, token: &str) {
    let verification_url = format!("{}/verify-email?token={}", base_url, token);
    tracing::info!("Verification email for {}: {}", email, verification_url);
}
