//! Account flows: registration, sign-in, sign-out and password reset.
//!
//! Input checks happen here so the auth service only sees complete requests.

use crate::{
    LedgerError, ResultLedger,
    remote::{AuthService, Profile, Session},
};

fn required(fields: &[&str]) -> ResultLedger<()> {
    if fields.iter().any(|field| field.trim().is_empty()) {
        return Err(LedgerError::Validation("all fields are required".to_string()));
    }
    Ok(())
}

pub fn register<A: AuthService>(
    auth: &A,
    name: &str,
    phone: &str,
    email: &str,
    password: &str,
) -> ResultLedger<Session> {
    required(&[name, phone, email, password])?;
    let session = auth.sign_up(name, phone, email, password)?;
    tracing::info!("registered {}", session.owner);
    Ok(session)
}

pub fn sign_in<A: AuthService>(auth: &A, email: &str, password: &str) -> ResultLedger<Session> {
    required(&[email, password])?;
    let session = auth.sign_in(email, password)?;
    tracing::info!("signed in {}", session.owner);
    Ok(session)
}

/// Signs out. Callers stop their [`LiveLedger`](crate::LiveLedger) first.
pub fn sign_out<A: AuthService>(auth: &A, session: &Session) -> ResultLedger<()> {
    auth.sign_out(session)?;
    tracing::info!("signed out {}", session.owner);
    Ok(())
}

pub fn request_password_reset<A: AuthService>(auth: &A, email: &str) -> ResultLedger<()> {
    if email.trim().is_empty() {
        return Err(LedgerError::Validation("email is required".to_string()));
    }
    auth.send_password_reset(email)
}

pub fn profile<A: AuthService>(auth: &A, session: &Session) -> ResultLedger<Profile> {
    auth.profile(&session.owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;

    #[test]
    fn blank_fields_never_reach_the_backend() {
        let backend = MemoryBackend::new();
        assert_eq!(
            register(&backend, "Ana", "", "ana@example.com", "secret1"),
            Err(LedgerError::Validation("all fields are required".to_string()))
        );
        assert!(matches!(
            sign_in(&backend, "ana@example.com", " "),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            request_password_reset(&backend, ""),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn register_sign_out_sign_in_and_profile() {
        let backend = MemoryBackend::new();
        let session = register(&backend, "Ana", "555", "ana@example.com", "secret1").unwrap();
        sign_out(&backend, &session).unwrap();

        let session = sign_in(&backend, "ana@example.com", "secret1").unwrap();
        let profile = profile(&backend, &session).unwrap();
        assert_eq!(profile.email, "ana@example.com");
        assert_eq!(profile.phone, "555");

        request_password_reset(&backend, "ana@example.com").unwrap();
        assert!(matches!(
            request_password_reset(&backend, "bob@example.com"),
            Err(LedgerError::Auth(_))
        ));
    }
}
