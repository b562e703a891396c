use http::StatusCode;

use super::chain::AuthFailure;

/// Shown when a credential was supplied but no scheme accepted it.
pub const TOKEN_AUTH_FAILED: &str = "Failed token authentication, please double-check that your \
     repository upload token matches the token in your repository settings";

/// Shown when no credential was supplied at all.
pub const AUTH_REQUIRED: &str = "Authentication credentials were not provided";

/// Collapse a terminal authentication failure onto one of exactly two
/// stable user-facing messages. The internal rejection reason is logged
/// here and never echoed to the caller, so responses cannot be used as
/// an oracle for repository existence or token format.
pub fn present(failure: &AuthFailure) -> (StatusCode, &'static str) {
    match &failure.rejection {
        Some(rejection) => {
            tracing::warn!(reason = %rejection, "upload authentication rejected");
        }
        None => {
            tracing::debug!("no authentication scheme matched the request");
        }
    }

    if failure.credential_present {
        (StatusCode::UNAUTHORIZED, TOKEN_AUTH_FAILED)
    } else {
        (StatusCode::UNAUTHORIZED, AUTH_REQUIRED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::strategy::AuthRejection;

    #[test]
    fn every_rejection_maps_to_one_of_two_messages() {
        let rejections = [
            Some(AuthRejection::InvalidCredential("unknown repository token")),
            Some(AuthRejection::TokenlessDenied("not a valid tokenless upload")),
            Some(AuthRejection::ExternalVerificationFailed(
                "circleci timed out".to_string(),
            )),
            None,
        ];

        for rejection in rejections {
            let with_credential = present(&AuthFailure {
                rejection: rejection.clone(),
                credential_present: true,
            });
            assert_eq!(with_credential, (StatusCode::UNAUTHORIZED, TOKEN_AUTH_FAILED));

            let without_credential = present(&AuthFailure {
                rejection,
                credential_present: false,
            });
            assert_eq!(without_credential, (StatusCode::UNAUTHORIZED, AUTH_REQUIRED));
        }
    }

    #[test]
    fn messages_never_leak_internal_identifiers() {
        for message in [TOKEN_AUTH_FAILED, AUTH_REQUIRED] {
            assert!(!message.contains("uuid"));
            assert!(!message.contains("repoid"));
            assert!(!message.contains("key"));
        }
    }
}
