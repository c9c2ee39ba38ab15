//! The gift-assignment draw.
//!
//! Members are shuffled into a uniformly random order and each one gives to
//! the next, wrapping around at the end. The result is always a single cycle
//! through every member, so nobody draws themselves once there are two or
//! more members.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::error::{SantaError, SantaResult};
use crate::model::{Assignments, Member};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pairing {
    pub giver: Member,
    pub recipient: Member,
}

/// Returns a shuffled copy of `members`; the input is left as is.
pub fn shuffled<R: Rng + ?Sized>(members: &[Member], rng: &mut R) -> Vec<Member> {
    let mut order = members.to_vec();
    order.shuffle(rng);
    order
}

/// Pairs each member with the one after it, the last with the first.
pub fn pair_in_order(order: &[Member]) -> SantaResult<Vec<Pairing>> {
    check_drawable(order)?;
    let n = order.len();
    Ok(order
        .iter()
        .enumerate()
        .map(|(i, giver)| Pairing {
            giver: giver.clone(),
            recipient: order[(i + 1) % n].clone(),
        })
        .collect())
}

pub fn draw<R: Rng + ?Sized>(members: &[Member], rng: &mut R) -> SantaResult<Vec<Pairing>> {
    check_drawable(members)?;
    pair_in_order(&shuffled(members, rng))
}

pub fn into_assignments(pairings: Vec<Pairing>) -> Assignments {
    pairings
        .into_iter()
        .map(|p| (p.giver.email, p.recipient.name))
        .collect()
}

fn check_drawable(members: &[Member]) -> SantaResult<()> {
    if members.len() < 2 {
        return Err(SantaError::invalid(
            "members",
            format!("a draw needs at least 2 members, got {}", members.len()),
        ));
    }
    let mut seen = HashSet::with_capacity(members.len());
    if let Some(dup) = members.iter().find(|m| !seen.insert(m.email.as_str())) {
        return Err(SantaError::invalid(
            "members",
            format!("duplicate email {}", dup.email),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    fn member(tag: &str) -> Member {
        Member {
            email: format!("{tag}@x"),
            name: tag.to_uppercase(),
        }
    }

    fn members(n: usize) -> Vec<Member> {
        (0..n).map(|i| member(&format!("m{i}"))).collect()
    }

    fn successor_map(pairings: &[Pairing]) -> HashMap<String, String> {
        pairings
            .iter()
            .map(|p| (p.giver.email.clone(), p.recipient.email.clone()))
            .collect()
    }

    /// Walks the giver -> recipient chain from the first giver and returns the
    /// length of the cycle it closes.
    fn cycle_len(pairings: &[Pairing]) -> usize {
        let next = successor_map(pairings);
        let start = &pairings[0].giver.email;
        let mut current = &next[start];
        let mut steps = 1;
        while current != start {
            current = &next[current];
            steps += 1;
            assert!(steps <= pairings.len(), "chain does not return to start");
        }
        steps
    }

    #[test]
    fn identity_order_pairs_each_with_the_next() {
        let order = vec![member("a"), member("b"), member("c")];
        let assignments = into_assignments(pair_in_order(&order).unwrap());

        let expected: Assignments = [
            ("a@x".to_string(), "B".to_string()),
            ("b@x".to_string(), "C".to_string()),
            ("c@x".to_string(), "A".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(assignments, expected);
    }

    #[test]
    fn two_members_always_swap() {
        let pair = vec![member("a"), member("b")];
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let assignments = into_assignments(draw(&pair, &mut rng).unwrap());
            assert_eq!(assignments["a@x"], "B");
            assert_eq!(assignments["b@x"], "A");
        }
    }

    #[test]
    fn draw_is_a_single_cycle_without_self_assignment() {
        for n in 2..=12 {
            let roster = members(n);
            for seed in 0..25 {
                let mut rng = ChaCha8Rng::seed_from_u64(seed * 31 + n as u64);
                let pairings = draw(&roster, &mut rng).unwrap();

                assert_eq!(pairings.len(), n);
                assert!(pairings.iter().all(|p| p.giver != p.recipient));

                let givers: HashSet<_> = pairings.iter().map(|p| &p.giver.email).collect();
                let recipients: HashSet<_> =
                    pairings.iter().map(|p| &p.recipient.email).collect();
                assert_eq!(givers.len(), n);
                assert_eq!(recipients.len(), n);
                assert_eq!(cycle_len(&pairings), n);
            }
        }
    }

    #[test]
    fn same_seed_reproduces_the_draw() {
        let roster = members(6);
        let first = draw(&roster, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let second = draw(&roster, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(first, second);

        let mut expected_order = roster.clone();
        expected_order.shuffle(&mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(first, pair_in_order(&expected_order).unwrap());
    }

    #[test]
    fn shuffle_leaves_input_untouched() {
        let roster = members(5);
        let before = roster.clone();
        let _ = shuffled(&roster, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(roster, before);
    }

    #[test]
    fn cycles_are_roughly_uniform() {
        // Four members admit (4 - 1)! = 6 distinct cycles.
        let roster = members(4);
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let trials = 6_000;
        let mut counts: HashMap<Vec<(String, String)>, usize> = HashMap::new();
        for _ in 0..trials {
            let mut cycle: Vec<_> = successor_map(&draw(&roster, &mut rng).unwrap())
                .into_iter()
                .collect();
            cycle.sort();
            *counts.entry(cycle).or_default() += 1;
        }

        assert_eq!(counts.len(), 6);
        let expected = trials / 6;
        for (cycle, count) in counts {
            assert!(
                count.abs_diff(expected) < expected / 5,
                "cycle {cycle:?} drawn {count} times, expected about {expected}"
            );
        }
    }

    #[test]
    fn rejects_too_few_members() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            draw(&[], &mut rng),
            Err(SantaError::InvalidInput { .. })
        ));
        assert!(matches!(
            draw(&[member("a")], &mut rng),
            Err(SantaError::InvalidInput { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_emails() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let roster = vec![member("a"), member("b"), member("a")];
        let err = draw(&roster, &mut rng).unwrap_err();
        assert_eq!(
            err,
            SantaError::InvalidInput {
                field: "members",
                reason: "duplicate email a@x".into()
            }
        );
    }
}
