//! Chronologically ordered push keys.
//!
//! A key is 8 characters of millisecond timestamp followed by 12 random
//! characters, all drawn from an alphabet whose byte order matches its index
//! order. Keys generated in the same millisecond reuse the random suffix
//! incremented by one, so lexicographic order equals generation order.

use rand::Rng;
use std::sync::Mutex;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

#[derive(Debug, Default)]
struct GeneratorState {
    last_millis: i64,
    last_random: [u8; RANDOM_CHARS],
}

/// Generates push keys. Safe to share across tasks.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<GeneratorState>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a key for the current wall-clock time.
    pub fn next_id(&self) -> String {
        self.next_id_at(chrono::Utc::now().timestamp_millis())
    }

    /// Generates a key for `now_millis`.
    ///
    /// A clock that steps backwards is treated as the last seen millisecond
    /// so ordering still holds.
    pub fn next_id_at(&self, now_millis: i64) -> String {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());

        let now = now_millis.max(state.last_millis);
        if now == state.last_millis && state.last_millis != 0 {
            increment(&mut state.last_random);
        } else {
            let mut rng = rand::thread_rng();
            for slot in state.last_random.iter_mut() {
                *slot = rng.gen_range(0..64);
            }
        }
        state.last_millis = now;

        let mut id = String::with_capacity(TIME_CHARS + RANDOM_CHARS);
        let mut time_chars = [0u8; TIME_CHARS];
        let mut remaining = now.max(0) as u64;
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }
        id.extend(time_chars.iter().map(|&c| c as char));
        id.extend(
            state
                .last_random
                .iter()
                .map(|&index| PUSH_CHARS[index as usize] as char),
        );
        id
    }
}

/// Adds one to the base-64 suffix, carrying leftwards.
fn increment(random: &mut [u8; RANDOM_CHARS]) {
    for slot in random.iter_mut().rev() {
        if *slot == 63 {
            *slot = 0;
        } else {
            *slot += 1;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_is_byte_ordered() {
        assert!(PUSH_CHARS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_id_shape() {
        let id = PushIdGenerator::new().next_id();
        assert_eq!(id.len(), 20);
        assert!(id.bytes().all(|b| PUSH_CHARS.contains(&b)));
    }

    #[test]
    fn test_same_millisecond_ids_are_ordered() {
        let generator = PushIdGenerator::new();
        let ids: Vec<String> = (0..500).map(|_| generator.next_id_at(1_700_000_000_000)).collect();

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }

    #[test]
    fn test_later_time_sorts_after_and_backward_clock_is_clamped() {
        let generator = PushIdGenerator::new();
        let first = generator.next_id_at(1_000);
        let second = generator.next_id_at(2_000);
        let stepped_back = generator.next_id_at(1_500);

        assert!(first < second);
        assert!(second < stepped_back);
    }

    #[test]
    fn test_increment_carries() {
        let mut random = [0u8; RANDOM_CHARS];
        random[RANDOM_CHARS - 1] = 63;
        increment(&mut random);
        assert_eq!(random[RANDOM_CHARS - 1], 0);
        assert_eq!(random[RANDOM_CHARS - 2], 1);
    }
}
