use loopvote_core::crypto::KeyPair;
use loopvote_core::types::{Address20, Hash32};
use loopvote_core::votes::BlockVotes;
use proptest::prelude::*;

fn make_reps(n: usize) -> (Vec<KeyPair>, Vec<Address20>) {
    let keys: Vec<KeyPair> = (0..n).map(|_| KeyPair::generate()).collect();
    let addrs = keys.iter().map(KeyPair::address).collect();
    (keys, addrs)
}

proptest! {
    /// Once `true_count` reaches `ceil(N * ratio)`, the aggregator is always
    /// decided true, regardless of how many reps never vote.
    #[test]
    fn true_quorum_always_decides_true(
        rep_count in 4usize..60,
        ratio_pct in 10u32..100,
    ) {
        let ratio = ratio_pct as f64 / 100.0;
        let (keys, addrs) = make_reps(rep_count);
        let block_hash = Hash32::new([0x11; 32]);
        let quorum = (rep_count as f64 * ratio).ceil() as usize;

        let mut votes = BlockVotes::new(addrs, ratio, 1, 0, block_hash);
        for kp in keys.iter().take(quorum) {
            let vote = loopvote_core::votes::BlockVote {
                rep: kp.address(),
                timestamp: 1,
                block_height: 1,
                round: 0,
                block_hash,
                signature: loopvote_core::types::Signature65::empty(),
            }
            .sign(|d| kp.sign_prehash(d.as_bytes()).unwrap());
            votes.add_vote(vote).unwrap();
        }

        prop_assert_eq!(votes.get_result(), Some(true));
        prop_assert!(votes.is_completed());
    }

    /// Once `false_count` exceeds `N - Q`, true can no longer reach quorum
    /// and the aggregator decides false.
    #[test]
    fn exhausting_true_always_decides_false(
        rep_count in 4usize..60,
        ratio_pct in 10u32..100,
    ) {
        let ratio = ratio_pct as f64 / 100.0;
        let (keys, addrs) = make_reps(rep_count);
        let block_hash = Hash32::new([0x11; 32]);
        let quorum = (rep_count as f64 * ratio).ceil() as usize;
        let needed_false = rep_count - quorum + 1;
        prop_assume!(needed_false <= rep_count);

        let mut votes = BlockVotes::new(addrs, ratio, 1, 0, block_hash);
        for kp in keys.iter().take(needed_false) {
            let vote = loopvote_core::votes::BlockVote {
                rep: kp.address(),
                timestamp: 1,
                block_height: 1,
                round: 0,
                block_hash: Hash32::empty(),
                signature: loopvote_core::types::Signature65::empty(),
            }
            .sign(|d| kp.sign_prehash(d.as_bytes()).unwrap());
            votes.add_vote(vote).unwrap();
        }

        prop_assert_eq!(votes.get_result(), Some(false));
        prop_assert!(votes.is_completed());
    }

    /// Below quorum in both directions, the aggregator stays pending.
    #[test]
    fn insufficient_votes_stay_pending(rep_count in 10usize..60) {
        let ratio = 0.67;
        let (keys, addrs) = make_reps(rep_count);
        let block_hash = Hash32::new([0x11; 32]);
        let quorum = (rep_count as f64 * ratio).ceil() as usize;
        prop_assume!(quorum > 1);

        let mut votes = BlockVotes::new(addrs, ratio, 1, 0, block_hash);
        let vote = loopvote_core::votes::BlockVote {
            rep: keys[0].address(),
            timestamp: 1,
            block_height: 1,
            round: 0,
            block_hash,
            signature: loopvote_core::types::Signature65::empty(),
        }
        .sign(|d| keys[0].sign_prehash(d.as_bytes()).unwrap());
        votes.add_vote(vote).unwrap();

        prop_assert_eq!(votes.get_result(), None);
        prop_assert!(!votes.is_completed());
    }
}
