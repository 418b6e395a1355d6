// utils.rs
use rand::Rng;

use crate::models::DeviceId;

pub const ID_LENGTH: usize = 8;

/// Random identifier of uppercase ASCII letters, uniform per character.
pub fn generate_id() -> DeviceId {
    let mut rng = rand::thread_rng();
    let id: String = (0..ID_LENGTH)
        .map(|_| char::from(rng.gen_range(b'A'..=b'Z')))
        .collect();
    DeviceId::from(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_eight_uppercase_letters() {
        for _ in 0..100 {
            let id = generate_id();
            assert_eq!(id.as_str().len(), ID_LENGTH);
            assert!(id.as_str().chars().all(|c| c.is_ascii_uppercase()));
        }
    }
}
