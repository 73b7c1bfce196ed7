use ring::digest;

use super::errors::VerificationError;
use crate::assertion::{AssertionOptions, AuthenticatorDataView};

/// Checks decoded authenticator data against what the request asked for.
///
/// The rpIdHash must equal SHA-256 of `rp_id`, and the UP / UV flags must be
/// set whenever the matching option was requested. Signature verification
/// does not depend on this check.
pub fn check_authenticator_data(
    auth_data: &[u8],
    rp_id: &str,
    options: AssertionOptions,
) -> Result<(), VerificationError> {
    let view = AuthenticatorDataView::parse(auth_data)
        .map_err(|e| VerificationError::AuthenticatorData(e.to_string()))?;
    view.log_details();

    let expected_hash = digest::digest(&digest::SHA256, rp_id.as_bytes());
    if view.rp_id_hash != expected_hash.as_ref() {
        tracing::error!("RP ID hash mismatch for '{}'", rp_id);
        return Err(VerificationError::RelyingPartyMismatch(rp_id.to_string()));
    }

    if options.user_presence && !view.is_user_present() {
        return Err(VerificationError::UserPresenceMissing);
    }

    if options.user_verification && !view.is_user_verified() {
        return Err(VerificationError::UserVerificationMissing);
    }

    tracing::debug!("Authenticator data matches '{}'", rp_id);
    Ok(())
}
