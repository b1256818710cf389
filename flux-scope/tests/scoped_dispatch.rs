//! Dispatch behaviour of scoped reducers built by `Flux`

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use flux_scope::testing::TestHarness;
use flux_scope::{
    assert_applied, assert_skipped, create_action, DynPayload, Flux, FluxError, Transition,
};

#[derive(Clone, Debug, PartialEq)]
struct State {
    aaa: String,
    bbb: i32,
}

impl Default for State {
    fn default() -> Self {
        Self {
            aaa: String::new(),
            bbb: -1,
        }
    }
}

#[derive(Clone, Debug)]
struct Hoge {
    aaa: String,
}

#[derive(Clone, Debug)]
struct Fuga {
    bbb: i32,
}

fn hoge(aaa: &str) -> Hoge {
    Hoge { aaa: aaa.into() }
}

fn hoge_fuga_flux() -> Flux<State> {
    let flux = Flux::new(State::default());
    flux.add_action("hoge", |s: &mut State, p: Hoge| s.aaa = p.aaa);
    flux.add_scoped_action("fuga", "baz", |s: &mut State, p: Fuga| s.bbb = p.bbb);
    flux
}

#[test]
fn test_out_of_scope_action_skipped_until_activated() {
    let flux = hoge_fuga_flux();
    let reducer = flux.create_reducer_scoped(Vec::<String>::new());
    let envelope = flux
        .act_named(["hoge", "fuga"])
        .unwrap()
        .with([DynPayload::new(hoge("x")), DynPayload::new(Fuga { bbb: 5 })])
        .unwrap();

    let state = reducer.reduce(None, &envelope);
    assert_eq!(state, State { aaa: "x".into(), bbb: -1 });

    flux.activate("baz");
    let state = reducer.reduce(None, &envelope);
    assert_eq!(state, State { aaa: "x".into(), bbb: 5 });
}

#[test]
fn test_callback_batch() {
    let flux = hoge_fuga_flux();
    let reducer = flux.create_reducer_scoped("baz");

    let envelope = flux.act_with(|c| {
        [
            c.create("hoge", hoge("y")),
            c.create("fuga", Fuga { bbb: 9 }),
        ]
    });
    let state = reducer.reduce(Some(State::default()), &envelope);
    assert_eq!(state, State { aaa: "y".into(), bbb: 9 });
}

#[test]
fn test_callback_batch_may_be_empty() {
    let flux = hoge_fuga_flux();
    let reducer = flux.create_reducer();

    let envelope = flux.act_with(|_| Vec::new());
    assert!(envelope.is_empty());
    assert_eq!(reducer.reduce(None, &envelope), State::default());
}

#[test]
fn test_tokens_unique_across_engines() {
    let first = hoge_fuga_flux();
    let second = hoge_fuga_flux();

    let a = first.action_type::<Hoge>("hoge").unwrap();
    let b = second.action_type::<Hoge>("hoge").unwrap();
    assert_eq!(a.name(), b.name());
    assert_ne!(a, b);
    assert_ne!(first.marker(), second.marker());
}

#[test]
fn test_sub_actions_apply_left_to_right() {
    let flux = Flux::new(State::default());
    let hoge = flux.add_action("hoge", |s: &mut State, p: Hoge| s.aaa = p.aaa);
    let fuga = flux.add_action("fuga", |s: &mut State, p: Fuga| {
        // observes the state left by `hoge`
        s.bbb = p.bbb + s.aaa.len() as i32;
    });

    let reducer = flux.create_reducer();
    let forward = flux.act((&hoge, &fuga)).with((hoge_payload(), Fuga { bbb: 10 }));
    let state = reducer.reduce(None, &forward);
    assert_eq!(state, State { aaa: "four".into(), bbb: 14 });

    // reversed order: fuga sees the empty string
    let reversed = flux.act((&fuga, &hoge)).with((Fuga { bbb: 10 }, hoge_payload()));
    let state = reducer.reduce(None, &reversed);
    assert_eq!(state, State { aaa: "four".into(), bbb: 10 });
}

fn hoge_payload() -> Hoge {
    hoge("four")
}

#[test]
fn test_direct_and_curried_agree() {
    let direct = Flux::new(State::default());
    let direct_hoge = direct.add_action("hoge", |s: &mut State, p: Hoge| s.aaa = p.aaa);

    let curried = Flux::new(State::default());
    let curried_hoge = curried.add_curried_action("hoge", |p: Hoge| {
        move |s: &mut State| {
            Some(State {
                aaa: p.aaa,
                ..s.clone()
            })
        }
    });

    let a = direct
        .create_reducer()
        .reduce(None, &direct.act(&direct_hoge).with(hoge("z")));
    let b = curried
        .create_reducer()
        .reduce(None, &curried.act(&curried_hoge).with(hoge("z")));
    assert_eq!(a, b);
    assert_eq!(a.aaa, "z");
}

#[test]
fn test_transition_returning_none_keeps_state() {
    let flux = Flux::new(State::default());
    let maybe = flux.add_action("maybe", |s: &mut State, replace: bool| {
        replace.then(|| State { aaa: "replaced".into(), ..s.clone() })
    });
    let reducer = flux.create_reducer();

    let kept = reducer.reduce(None, &flux.act(&maybe).with(false));
    assert_eq!(kept, State::default());

    let replaced = reducer.reduce(None, &flux.act(&maybe).with(true));
    assert_eq!(replaced.aaa, "replaced");
}

#[test]
fn test_foreign_envelope_is_a_noop() {
    let flux = hoge_fuga_flux();
    let other = hoge_fuga_flux();
    let other_hoge = other.action_type::<Hoge>("hoge").unwrap();

    let reducer = flux.create_reducer();
    let state = State { aaa: "keep".into(), bbb: 3 };
    let (next, report) =
        reducer.reduce_with_report(Some(state.clone()), &other.act(&other_hoge).with(hoge("x")));
    assert_eq!(next, state);
    assert!(report.foreign);

    // not an envelope at all
    assert_eq!(reducer.reduce_dyn(Some(state.clone()), &42u8), state);
}

#[test]
fn test_unregistered_standalone_action_is_skipped() {
    let flux = hoge_fuga_flux();
    let stray = create_action::<Hoge>("hoge");
    let mut harness = TestHarness::new(flux.create_reducer());

    let report = harness.dispatch(&flux.envelope([stray.create(hoge("x"))]));
    assert_skipped!(report, "hoge");
    assert_eq!(harness.state(), &State::default());
}

#[test]
fn test_standalone_action_bound_to_engine() {
    let flux = Flux::new(State::default());
    let rename = create_action::<Hoge>("rename");
    flux.add_action_for(
        &rename,
        Transition::direct(|s: &mut State, p: Hoge| s.aaa = p.aaa),
        Some(vec!["editor".into()]),
    );

    let mut harness = TestHarness::new(flux.create_reducer());
    let report = harness.dispatch(&flux.act(&rename).with(hoge("bound")));
    assert_applied!(report, "rename");
    assert_eq!(harness.state().aaa, "bound");
}

#[test]
fn test_named_batch_keeps_falsy_payloads() {
    #[derive(Clone, Debug, Default, PartialEq)]
    struct Flags {
        count: i32,
        enabled: bool,
        label: String,
    }

    let flux = Flux::new(Flags {
        count: 9,
        enabled: true,
        label: "x".into(),
    });
    flux.add_action("count", |s: &mut Flags, v: i32| s.count = v);
    flux.add_action("enabled", |s: &mut Flags, v: bool| s.enabled = v);
    flux.add_action("label", |s: &mut Flags, v: String| s.label = v);
    let reducer = flux.create_reducer();

    let envelope = flux
        .act_named(["count", "enabled", "label"])
        .unwrap()
        .with([
            DynPayload::new(0i32),
            DynPayload::new(false),
            DynPayload::new(String::new()),
        ])
        .unwrap();
    assert_eq!(envelope.len(), 3);
    assert_eq!(reducer.reduce(None, &envelope), Flags::default());

    // only positions actually supplied survive
    let envelope = flux
        .act_named(["count", "enabled", "label"])
        .unwrap()
        .with([DynPayload::new(0i32)])
        .unwrap();
    assert_eq!(envelope.names().collect::<Vec<_>>(), vec!["count"]);
}

#[test]
fn test_named_batch_errors() {
    let flux = hoge_fuga_flux();
    assert!(matches!(
        flux.act_named(["nope"]),
        Err(FluxError::UnknownAction(name)) if name == "nope"
    ));
    assert!(matches!(
        flux.act_named(["hoge"]).unwrap().with([DynPayload::new(1u8)]),
        Err(FluxError::PayloadMismatch { action }) if action == "hoge"
    ));
}

#[test]
fn test_transition_toggles_scope_mid_envelope() {
    let flux = hoge_fuga_flux();
    let engine = flux.downgrade();
    let unlock = flux.add_action("unlock", move |_: &mut State, _: ()| {
        if let Some(flux) = engine.upgrade() {
            flux.activate("baz");
        }
    });
    let fuga = flux.action_type::<Fuga>("fuga").unwrap();

    let mut harness = TestHarness::new(flux.create_reducer_scoped(Vec::<String>::new()));
    let report = harness.dispatch(
        &flux
            .act((&fuga, &unlock, &fuga))
            .with((Fuga { bbb: 1 }, (), Fuga { bbb: 2 })),
    );

    assert_eq!(report.applied_names(), vec!["unlock", "fuga"]);
    assert_eq!(report.skipped_names(), vec!["fuga"]);
    assert_eq!(harness.state().bbb, 2);
}

#[test]
fn test_engine_freed_when_handles_dropped() {
    struct DropFlag(Rc<Cell<bool>>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    let dropped = Rc::new(Cell::new(false));
    let weak = {
        let flux = hoge_fuga_flux();
        let engine = flux.downgrade();
        let guard = DropFlag(Rc::clone(&dropped));
        flux.add_action("unlock", move |_: &mut State, _: ()| {
            let _guard = &guard;
            if let Some(flux) = engine.upgrade() {
                flux.activate("baz");
            }
        });

        let mut harness = TestHarness::new(flux.create_reducer_scoped(Vec::<String>::new()));
        let unlock = flux.action_type::<()>("unlock").unwrap();
        assert_applied!(harness.dispatch(&flux.act(&unlock).with(())), "unlock");
        assert!(flux.is_active("baz"));
        flux.downgrade()
    };

    assert!(dropped.get());
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_scope_changes_reach_existing_reducer() {
    let flux = hoge_fuga_flux();
    let fuga = flux.action_type::<Fuga>("fuga").unwrap();
    let reducer = flux.create_reducer();
    let envelope = flux.act(&fuga).with(Fuga { bbb: 7 });

    assert_eq!(reducer.reduce(None, &envelope).bbb, 7);

    flux.deactivate_all();
    assert_eq!(reducer.reduce(None, &envelope).bbb, -1);

    let mut scopes = HashMap::new();
    scopes.insert("baz".to_string(), true);
    assert_eq!(flux.load_scopes(&scopes), 1);
    assert_eq!(reducer.reduce(None, &envelope).bbb, 7);
}

#[test]
fn test_lookup_is_memoized_between_changes() {
    let flux = hoge_fuga_flux();
    flux.create_reducer_scoped(Vec::<String>::new());

    let first = flux.lookup();
    assert!(Rc::ptr_eq(&first, &flux.lookup()));
    assert_eq!(first.len(), 1);

    flux.activate("baz");
    let second = flux.lookup();
    assert!(!Rc::ptr_eq(&first, &second));
    assert_eq!(second.len(), 2);
}

#[test]
fn test_into_fn_matches_reduce() {
    let flux = hoge_fuga_flux();
    let hoge_type = flux.action_type::<Hoge>("hoge").unwrap();
    let reducer = flux.create_reducer();
    let envelope = flux.act(&hoge_type).with(hoge("fn"));

    let expected = reducer.reduce(None, &envelope);
    let reduce = reducer.into_fn();
    assert_eq!(reduce(None, &envelope), expected);
}
