//! Periodic check that the held credential is still accepted.

use crate::{error::ErrorKind, provider::Provider, token::Credential};

/// Returns whether `credential` is accepted by the provider.
///
/// An absent credential, a rejected credential and a check that could not be
/// performed all yield `false`. The three are logged differently.
pub async fn is_valid<P>(provider: &P, credential: Option<&Credential>) -> bool
where
    P: Provider + ?Sized,
{
    let Some(credential) = credential else {
        info!("no token available; please authorize");
        return false;
    };

    match provider.validate(credential).await {
        Ok(true) => {
            info!("token is valid");
            true
        }
        Ok(false) => {
            warn!("token is invalid; please reauthorize");
            false
        }
        Err(e) if e.kind == ErrorKind::Network => {
            error!("error checking token validity: {e}");
            false
        }
        Err(e) => {
            error!("token check failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeProvider;

    #[tokio::test]
    async fn absent_credential_is_invalid() {
        let provider = FakeProvider::valid();
        assert!(!is_valid(&provider, None).await);
    }

    #[tokio::test]
    async fn maps_provider_answer() {
        let credential = Credential::new("token").unwrap();
        let provider = FakeProvider::default();

        *provider.validity.lock().unwrap() = Some(true);
        assert!(is_valid(&provider, Some(&credential)).await);

        *provider.validity.lock().unwrap() = Some(false);
        assert!(!is_valid(&provider, Some(&credential)).await);

        *provider.validity.lock().unwrap() = None;
        assert!(!is_valid(&provider, Some(&credential)).await);
    }
}
