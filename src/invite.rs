use rand::Rng;

/// Characters that cannot be confused with each other when read aloud or
/// copied by hand: no `0`/`O`, `1`/`I`/`L`.
pub const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub const INVITE_CODE_LEN: usize = 6;

/// How many fresh codes to try before giving up on a unique one.
pub const INVITE_CODE_ATTEMPTS: usize = 5;

#[must_use]
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| char::from(INVITE_ALPHABET[rng.gen_range(0..INVITE_ALPHABET.len())]))
        .collect()
}

/// Upper-cases and trims user-typed codes so lookups are forgiving.
#[must_use]
pub fn canonical_invite_code(typed: &str) -> String {
    typed.trim().to_ascii_uppercase()
}
