//! End-to-end scenarios exercising the public surface together: parse a pattern, compile it to an
//! automaton, run strings against it, and sample from it with [rexfa::Xeger].
use {
    rand::{rngs::StdRng, SeedableRng},
    rexfa::{
        automaton::{dafsa, operations::run},
        regex::{self, NamedAutomata, SyntaxFlags},
        Xeger,
    },
};

fn compile(pattern: &str) -> rexfa::automaton::core::Automaton {
    regex::compile(pattern, SyntaxFlags::default(), &NamedAutomata::new(), None, 10_000).unwrap()
}

#[test]
fn vin_like_pattern_accepts_well_formed_identifiers_and_rejects_malformed_ones() {
    let a = compile("[A-Z]{2}[0-9]{2}[A-Z0-9]{4}[0-9]{7}([A-Z0-9]?){0,16}");
    assert!(run(&a, "AB12WXYZ1234567"));
    assert!(run(&a, "AB12WXYZ1234567ABCDEFGHIJKLMNOP"));
    assert!(!run(&a, "ab12WXYZ1234567"));
    assert!(!run(&a, "AB1WXYZ1234567"));
}

#[test]
fn email_like_pattern_accepts_a_local_part_at_a_domain() {
    let a = compile(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}");
    assert!(run(&a, "user.name+tag@example.com"));
    assert!(!run(&a, "not-an-email"));
    assert!(!run(&a, "@example.com"));
}

#[test]
fn ab_star_c_pattern_matches_every_repeat_count_of_b() {
    let a = compile("ab*c");
    assert!(run(&a, "ac"));
    for n in 1..=10 {
        assert!(run(&a, &format!("a{}c", "b".repeat(n))));
    }
    assert!(!run(&a, "abca"));
}

#[test]
fn xeger_generates_only_strings_the_same_pattern_accepts() {
    let pattern = r"(High|Medium|Low)";
    let reference = compile(pattern);
    let x = Xeger::new(pattern, 10_000).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let s = x.generate(&mut rng).unwrap();
        assert!(run(&reference, &s), "{s:?} was generated but not accepted by its own pattern");
    }
}

#[test]
fn dafsa_built_from_str_words_rejects_everything_not_inserted() {
    let a = dafsa::build(["car", "cars", "cat", "cats", "dog", "dogs"]).unwrap();
    for word in ["car", "cars", "cat", "cats", "dog", "dogs"] {
        assert!(run(&a, word));
    }
    assert!(!run(&a, "ca"));
    assert!(!run(&a, "catsup"));
}

#[test]
fn intersection_of_two_patterns_accepts_only_their_common_language() {
    let evens = compile("[0-9]*[02468]");
    let two_digit = compile("[0-9]{2}");
    let combined = rexfa::automaton::operations::intersection(&evens, &two_digit);
    assert!(run(&combined, "42"));
    assert!(!run(&combined, "43"));
    assert!(!run(&combined, "4"));
}
