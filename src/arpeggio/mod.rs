//! Arpeggiation engine — reorders a chord's pitches into a melodic line.
//!
//! [`arpeggiate`] is a pure function of its inputs. Only [`PlayMode::Random`]
//! consumes the random source; every other mode gives the same output for
//! the same input.

pub mod mode;

pub use mode::PlayMode;

use rand::seq::SliceRandom;
use rand::Rng;

/// Reorder `pitches` according to `mode`.
///
/// `Chord`, `Ascending` and `Pattern` return the input order unchanged
/// (pattern decoration happens before this step). `AscDesc` and `DescAsc`
/// return twice as many pitches as they receive.
pub fn arpeggiate<T, R>(pitches: &[T], mode: PlayMode, rng: &mut R) -> Vec<T>
where
    T: Copy,
    R: Rng + ?Sized,
{
    let asc = || pitches.to_vec();
    let desc = || pitches.iter().rev().copied().collect::<Vec<T>>();

    match mode {
        PlayMode::Chord | PlayMode::Ascending | PlayMode::Pattern => asc(),
        PlayMode::Descending => desc(),
        PlayMode::AscDesc => [asc(), desc()].concat(),
        PlayMode::DescAsc => [desc(), asc()].concat(),
        PlayMode::EvenAscOddAsc => parity(pitches, Group::Even, true, true),
        PlayMode::EvenAscOddDesc => parity(pitches, Group::Even, true, false),
        PlayMode::EvenDescOddAsc => parity(pitches, Group::Even, false, true),
        PlayMode::EvenDescOddDesc => parity(pitches, Group::Even, false, false),
        PlayMode::OddAscEvenAsc => parity(pitches, Group::Odd, true, true),
        PlayMode::OddAscEvenDesc => parity(pitches, Group::Odd, true, false),
        PlayMode::OddDescEvenAsc => parity(pitches, Group::Odd, false, true),
        PlayMode::OddDescEvenDesc => parity(pitches, Group::Odd, false, false),
        PlayMode::Random => {
            let mut out = asc();
            out.shuffle(rng);
            out
        }
    }
}

#[derive(Clone, Copy)]
enum Group {
    Even,
    Odd,
}

/// Split by index parity and join the two halves, `first` group leading.
/// `first_asc` / `second_asc` choose the direction of each half.
fn parity<T: Copy>(pitches: &[T], first: Group, first_asc: bool, second_asc: bool) -> Vec<T> {
    let (evens, odds): (Vec<(usize, &T)>, Vec<(usize, &T)>) =
        pitches.iter().enumerate().partition(|(i, _)| i % 2 == 0);
    let collect = |group: Vec<(usize, &T)>, ascending: bool| -> Vec<T> {
        let mut v: Vec<T> = group.into_iter().map(|(_, p)| *p).collect();
        if !ascending {
            v.reverse();
        }
        v
    };
    let (lead, tail) = match first {
        Group::Even => (evens, odds),
        Group::Odd => (odds, evens),
    };
    let mut out = collect(lead, first_asc);
    out.extend(collect(tail, second_asc));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SEED: u64 = 42;

    fn arp(pitches: &[i32], mode: PlayMode) -> Vec<i32> {
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        arpeggiate(pitches, mode, &mut rng)
    }

    const C_MAJ7: [i32; 5] = [60, 64, 67, 71, 74];

    #[test]
    fn chord_is_identity() {
        assert_eq!(arp(&C_MAJ7, PlayMode::Chord), C_MAJ7.to_vec());
    }

    #[test]
    fn ascending_is_identity() {
        assert_eq!(arp(&C_MAJ7, PlayMode::Ascending), C_MAJ7.to_vec());
    }

    #[test]
    fn descending_reverses() {
        assert_eq!(arp(&C_MAJ7, PlayMode::Descending), vec![74, 71, 67, 64, 60]);
    }

    #[test]
    fn asc_desc_duplicates_the_full_set() {
        assert_eq!(
            arp(&[1, 2, 3], PlayMode::AscDesc),
            vec![1, 2, 3, 3, 2, 1]
        );
        assert_eq!(
            arp(&[1, 2, 3], PlayMode::DescAsc),
            vec![3, 2, 1, 1, 2, 3]
        );
    }

    #[test]
    fn parity_variants() {
        let p = [0, 1, 2, 3, 4];
        assert_eq!(arp(&p, PlayMode::EvenAscOddAsc), vec![0, 2, 4, 1, 3]);
        assert_eq!(arp(&p, PlayMode::EvenAscOddDesc), vec![0, 2, 4, 3, 1]);
        assert_eq!(arp(&p, PlayMode::EvenDescOddAsc), vec![4, 2, 0, 1, 3]);
        assert_eq!(arp(&p, PlayMode::EvenDescOddDesc), vec![4, 2, 0, 3, 1]);
        assert_eq!(arp(&p, PlayMode::OddAscEvenAsc), vec![1, 3, 0, 2, 4]);
        assert_eq!(arp(&p, PlayMode::OddAscEvenDesc), vec![1, 3, 4, 2, 0]);
        assert_eq!(arp(&p, PlayMode::OddDescEvenAsc), vec![3, 1, 0, 2, 4]);
        assert_eq!(arp(&p, PlayMode::OddDescEvenDesc), vec![3, 1, 4, 2, 0]);
    }

    #[test]
    fn pattern_is_a_no_op() {
        assert_eq!(arp(&C_MAJ7, PlayMode::Pattern), C_MAJ7.to_vec());
    }

    #[test]
    fn random_is_a_permutation() {
        let mut out = arp(&C_MAJ7, PlayMode::Random);
        out.sort_unstable();
        assert_eq!(out, C_MAJ7.to_vec());
    }

    #[test]
    fn random_is_reproducible_with_the_same_seed() {
        assert_eq!(
            arp(&C_MAJ7, PlayMode::Random),
            arp(&C_MAJ7, PlayMode::Random)
        );
    }

    #[test]
    fn deterministic_modes_preserve_length() {
        for mode in PlayMode::ALL {
            let expected = match mode {
                PlayMode::AscDesc | PlayMode::DescAsc => 2 * C_MAJ7.len(),
                _ => C_MAJ7.len(),
            };
            assert_eq!(arp(&C_MAJ7, mode).len(), expected, "{mode}");
        }
    }

    #[test]
    fn chord_and_descending_properties_hold_for_random_inputs() {
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        for len in 1..12 {
            let pitches: Vec<i32> = (0..len).map(|_| rng.gen_range(0..128)).collect();
            let reversed: Vec<i32> = pitches.iter().rev().copied().collect();
            assert_eq!(arpeggiate(&pitches, PlayMode::Chord, &mut rng), pitches);
            assert_eq!(arpeggiate(&pitches, PlayMode::Descending, &mut rng), reversed);
        }
    }

    #[test]
    fn empty_input() {
        for mode in PlayMode::ALL {
            assert!(arp(&[], mode).is_empty());
        }
    }
}
