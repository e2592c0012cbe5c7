use fnstream::{of, Functor, FunctorExt, Status, Stream};

#[test]
fn test_chunk_groups_values() {
    let chunks = of(1..=7).chunk(3).to_vec();
    assert_eq!(chunks, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
}

#[test]
fn test_chunk_zero_drains_everything() {
    let chunks = of(vec![1, 2, 3, 4]).chunk(0).to_vec();
    assert_eq!(chunks, vec![vec![1, 2, 3, 4]]);
}

#[test]
fn test_chunk_waits_for_a_full_group_on_live_streams() {
    let source: Stream<i32> = Stream::empty();
    let mut pairs = source.clone().chunk(2);

    source.push(1);
    assert_eq!(pairs.shift(), None);

    source.push(2);
    assert_eq!(pairs.shift(), Some(vec![1, 2]));
}

#[test]
fn test_split_starts_a_group_at_each_marker() {
    let groups = of(vec![1, 2, 0, 3, 0, 4]).split(|x| *x == 0).to_vec();
    assert_eq!(groups, vec![vec![1, 2], vec![0, 3], vec![0, 4]]);
}

#[test]
fn test_partition_routes_values_by_key() {
    let mut parts = of(vec![1, 2, 3, 4, 5, 6]).partition(|x| x % 2);

    let (odd_key, odd) = parts.shift().unwrap();
    let (even_key, even) = parts.shift().unwrap();
    assert_eq!(odd_key, 1);
    assert_eq!(even_key, 0);

    assert_eq!(odd.to_vec(), vec![1, 3, 5]);
    assert_eq!(even.to_vec(), vec![2, 4, 6]);
}

#[test]
fn test_partition_announces_keys_found_while_pulling_a_part() {
    let mut parts = of(vec![1, 3, 2]).partition(|x| x % 2);

    let (_, odd) = parts.shift().unwrap();
    assert_eq!(odd.to_vec(), vec![1, 3]);

    // 2 was met while the odd part was pulling
    let (key, even) = parts.shift().unwrap();
    assert_eq!(key, 0);
    assert_eq!(even.to_vec(), vec![2]);
}

#[test]
fn test_partition_starved_part_pulls_through_other_keys() {
    let values = std::iter::once(-1).chain(0..100_000).chain(std::iter::once(-2));
    let mut parts = of(values).partition(|x| *x < 0);

    let (key, negative) = parts.shift().unwrap();
    assert!(key);
    assert_eq!(negative.shift(), Some(-1));
    // every non-negative value is routed aside on the way to -2
    assert_eq!(negative.shift(), Some(-2));

    let (key, rest) = parts.shift().unwrap();
    assert!(!key);
    let rest = rest.to_vec();
    assert_eq!(rest.len(), 100_000);
    assert_eq!(rest.first(), Some(&0));
    assert_eq!(rest.last(), Some(&99_999));
    assert!(parts.shift().is_none());
}

#[test]
fn test_unique_and_dedup() {
    assert_eq!(of(vec![1, 1, 2, 2, 1]).unique().to_vec(), vec![1, 2]);
    assert_eq!(of(vec![1, 1, 2, 2, 1]).dedup().to_vec(), vec![1, 2, 1]);
}

#[test]
fn test_sort() {
    assert_eq!(of(vec![3, 1, 2]).sort().to_vec(), vec![1, 2, 3]);
    assert_eq!(of(vec![3, 1, 2]).sort_by(|a, b| b.cmp(a)).to_vec(), vec![3, 2, 1]);
}

#[test]
fn test_sort_is_stable() {
    let sorted = of(vec![(2, 'a'), (1, 'b'), (2, 'c')])
        .sort_by(|a, b| a.0.cmp(&b.0))
        .to_vec();
    assert_eq!(sorted, vec![(1, 'b'), (2, 'a'), (2, 'c')]);
}

#[test]
fn test_concat() {
    assert_eq!(of(vec![1, 2]).concat(of(vec![3])).to_vec(), vec![1, 2, 3]);
}

#[test]
fn test_concat_waits_for_live_first_input() {
    let first: Stream<i32> = Stream::empty();
    let mut both = first.clone().concat(of(vec![9]));

    first.push(1);
    assert_eq!(both.shift(), Some(1));
    assert_eq!(both.shift(), None);

    first.stop();
    assert_eq!(both.shift(), Some(9));
    assert_eq!(both.status(), Status::Done);
}

#[test]
fn test_join_and_chain() {
    let nested = of(vec![of(vec![1, 2]), of(vec![]), of(vec![3])]);
    assert_eq!(nested.join().to_vec(), vec![1, 2, 3]);

    let repeated = of(vec![1usize, 2, 3]).chain(|n| of(vec![n; n])).to_vec();
    assert_eq!(repeated, vec![1, 2, 2, 3, 3, 3]);
}

#[test]
fn test_syphon_separates_matches_from_the_rest() {
    let (mut rest, mut evens) = of(vec![1, 2, 3, 4, 5, 6]).syphon(|x| x % 2 == 0);

    assert_eq!(evens.shift(), Some(2));
    // 1 was parked for the other side on the way
    assert_eq!(rest.shift(), Some(1));
    assert_eq!(rest.shift(), Some(3));
    assert_eq!(evens.to_vec(), vec![4, 6]);
    assert_eq!((&mut rest).to_vec(), vec![5]);
    assert_eq!(rest.status(), Status::Done);
}

#[test]
fn test_fork_sides_read_independently() {
    let (mut left, mut right) = of(vec![1, 2, 3, 4]).fork();

    assert_eq!(left.shift(), Some(1));
    assert_eq!(left.shift(), Some(2));
    assert_eq!(left.shift(), Some(3));
    assert_eq!(right.shift(), Some(1));
    assert_eq!(left.shift(), Some(4));
    assert_eq!(left.shift(), None);
    assert_eq!(left.status(), Status::Done);

    assert_eq!(right.to_vec(), vec![2, 3, 4]);
}
