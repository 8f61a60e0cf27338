use sha2::{Digest, Sha256};
use tracing::debug;

use crate::session::SessionState;

/// Hex SHA-256 digest of a recording payload.
pub fn fingerprint(audio: &[u8]) -> String {
    format!("{:x}", Sha256::digest(audio))
}

/// Decide whether a recording is new for this session.
///
/// The recorder may hand over the same payload again on every refresh. A
/// payload is admitted only when its fingerprint differs from the last one
/// seen; the new fingerprint is recorded before anything else happens with the
/// audio, so a recording that later fails to transcribe is not retried.
pub fn admit(state: &mut SessionState, audio: &[u8]) -> bool {
    let digest = fingerprint(audio);
    if state.audio_fingerprint() == Some(digest.as_str()) {
        debug!("Ignoring repeated recording {}", &digest[..12]);
        return false;
    }
    debug!("New recording {} ({} bytes)", &digest[..12], audio.len());
    state.set_audio_fingerprint(digest);
    true
}
