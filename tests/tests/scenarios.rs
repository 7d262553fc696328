//! End-to-end verb-dispatch scenarios (spec.md §8), driven through the
//! public `VerbsService` the way an HTTP/STDIO front-end would, over a
//! fully mock-backed stack (in-memory RDF gateway, deterministic
//! embedding/concept/chat providers).

use memory_core::{AskMode, AugmentOperation, PanParams, TellContentType, Tilt, Zoom};
use test_utils::{mock_verbs_service, Fixture};

#[tokio::test]
async fn scenario_1_tell_ask_round_trip_finds_the_color_fact() {
    let verbs = mock_verbs_service(&Fixture::default());

    let tell = verbs
        .tell("florglings are turquoise creatures", TellContentType::Interaction, false, 0)
        .await;
    assert!(tell.success);
    assert_eq!(tell.payload["stored"], true);

    let ask = verbs.ask("what color are florglings?", AskMode::Standard, false, false, false, false, 1000).await;
    assert!(ask.success);
    let answer = ask.payload["answer"].as_str().unwrap().to_lowercase();
    assert!(answer.contains("turquoise"));
    assert_eq!(ask.zpt_state.last_query.as_deref(), Some("what color are florglings?"));
    assert_eq!(ask.zpt_state.zoom, Zoom::Entity);
    assert!(ask.payload["memories"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn scenario_2_zpt_state_persists_across_a_tell() {
    let verbs = mock_verbs_service(&Fixture::default());

    verbs.zoom(Zoom::Community, None, 0).await;
    verbs
        .pan(
            PanParams {
                domains: Some(vec!["technology".to_string()]),
                keywords: Some(vec!["AI".to_string(), "ML".to_string()]),
                temporal: None,
            },
            1,
        )
        .await;
    verbs.tilt(Tilt::Temporal, None, 2).await;
    let tell = verbs.tell("state persistence test", TellContentType::Interaction, false, 3).await;

    assert_eq!(tell.zpt_state.zoom, Zoom::Community);
    assert_eq!(tell.zpt_state.tilt, Tilt::Temporal);
    assert_eq!(tell.zpt_state.pan.domains, vec!["technology".to_string()]);
    assert_eq!(tell.zpt_state.pan.keywords, vec!["AI".to_string(), "ML".to_string()]);
}

#[tokio::test]
async fn scenario_3_last_query_provenance_survives_an_intervening_tell() {
    let verbs = mock_verbs_service(&Fixture::default());

    verbs.ask("What is neural architecture search?", AskMode::Standard, false, false, false, false, 0).await;
    verbs.zoom(Zoom::Unit, Some("automated machine learning"), 1).await;
    let tell = verbs.tell("this should not change lastQuery", TellContentType::Interaction, false, 2).await;

    assert_eq!(tell.zpt_state.last_query.as_deref(), Some("automated machine learning"));
}

#[tokio::test]
async fn scenario_5_eviction_keeps_the_touched_entry_over_its_untouched_peers() {
    let mut fixture = Fixture::default();
    fixture.short_term_cap = 3;
    let verbs = mock_verbs_service(&fixture);

    verbs.tell("alpha fact", TellContentType::Interaction, false, 0).await;
    verbs.tell("bravo fact", TellContentType::Interaction, false, 1).await;
    verbs.tell("charlie fact", TellContentType::Interaction, false, 2).await;

    let inspect_before = verbs.inspect("store", None, false);
    assert_eq!(inspect_before.payload["inspection"]["shortTerm"].as_u64().unwrap(), 3);

    // Touch "alpha" via recall so it outranks the untouched peers, then push
    // a fourth tell past the cap.
    verbs.recall("alpha fact", 3).await;
    let tell_d = verbs.tell("delta fact", TellContentType::Interaction, false, 4).await;
    assert!(tell_d.success);

    let inspect_after = verbs.inspect("store", None, false);
    assert_eq!(inspect_after.payload["inspection"]["shortTerm"].as_u64().unwrap(), 3);
}

#[tokio::test]
async fn scenario_6_baseline_ask_against_an_empty_store_never_crashes() {
    let verbs = mock_verbs_service(&Fixture::default());

    let ask = verbs.ask("What is artificial intelligence?", AskMode::Standard, false, false, false, false, 0).await;
    assert!(ask.success);
    let answer = ask.payload["answer"].as_str().unwrap().to_lowercase();
    assert!(
        answer.contains("don't have") || answer.contains("no information") || answer.contains("cannot answer")
            || answer.contains("not provided")
    );
}

#[tokio::test]
async fn dimension_invariant_holds_for_every_stored_interaction() {
    let verbs = mock_verbs_service(&Fixture::default());
    verbs.tell("a fact about cats", TellContentType::Interaction, false, 0).await;
    verbs.tell("a fact about dogs", TellContentType::Interaction, false, 1).await;

    let augment = verbs.augment("a fact about cats", AugmentOperation::Embedding, 2).await;
    assert_eq!(augment.payload["result"]["dimension"].as_u64().unwrap(), test_utils::TEST_DIMENSION as u64);
}

#[tokio::test]
async fn idempotent_zoom_produces_the_same_cursor_both_times() {
    let verbs = mock_verbs_service(&Fixture::default());
    let first = verbs.zoom(Zoom::Unit, None, 0).await;
    let second = verbs.zoom(Zoom::Unit, None, 1).await;

    assert_eq!(first.zpt_state.zoom, second.zpt_state.zoom);
    assert_eq!(first.zpt_state.pan, second.zpt_state.pan);
    assert_eq!(first.zpt_state.tilt, second.zpt_state.tilt);
}

#[tokio::test]
async fn tell_never_mutates_the_zpt_cursor() {
    let verbs = mock_verbs_service(&Fixture::default());
    verbs.zoom(Zoom::Corpus, Some("a pending query"), 0).await;
    let before = verbs.inspect("session", None, false);

    verbs.tell("anything at all", TellContentType::Interaction, false, 1).await;
    let after = verbs.inspect("session", None, false);

    assert_eq!(
        before.payload["inspection"]["zptState"],
        after.payload["inspection"]["zptState"]
    );
}

#[tokio::test]
async fn read_your_writes_within_a_session() {
    // spec.md §8: a tell followed by an ask from the same session must
    // observe the just-inserted interaction in retrieval candidates.
    let verbs = mock_verbs_service(&Fixture::default());
    let tell = verbs.tell("the vorpal blade goes snicker-snack", TellContentType::Interaction, false, 0).await;
    let id = tell.payload["id"].as_str().unwrap();

    let ask = verbs.ask("the vorpal blade goes snicker-snack", AskMode::Standard, false, false, false, false, 1).await;
    assert!(ask.success);

    let recall = verbs.recall("the vorpal blade goes snicker-snack", 2).await;
    let ids: Vec<&str> = recall.payload["memories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&id));
}

#[tokio::test]
async fn augment_relationships_links_the_two_most_similar_recent_interactions() {
    let verbs = mock_verbs_service(&Fixture::default());
    verbs.tell("alpha fact one", TellContentType::Interaction, false, 0).await;
    verbs.tell("alpha fact two", TellContentType::Interaction, false, 1).await;

    let augment = verbs.augment("ignored target", AugmentOperation::Relationships, 2).await;
    assert!(augment.success);
    assert!(augment.payload["result"]["sourceId"].is_string());
    assert!(augment.payload["result"]["targetId"].is_string());
}
