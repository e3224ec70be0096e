//! Index builder properties over whole documents
mod common;

use std::collections::HashSet;

use common::{DocBuilder, chatgpt_page, chatgpt_turn, el};
use turn_navigator::adapters::{Adapter, Platform};
use turn_navigator::indexer::{RescanOutcome, collect, rescan};
use turn_navigator::{AttachmentKind, EngineConfig, Identity, Role, Session};

fn index_of(doc: &turn_navigator::Document, platform: Platform) -> Session {
    let mut session = Session::new(platform);
    rescan(&Adapter::new(platform), doc, &mut session, &EngineConfig::default());
    session
}

#[test]
fn test_rescan_is_idempotent_on_unchanged_tree() {
    let doc = chatgpt_page(
        "idem",
        vec![
            chatgpt_turn("user", "u1", "How do I read a file?"),
            chatgpt_turn("assistant", "a1", "Use std::fs::read_to_string."),
            chatgpt_turn("user", "u2", "And write one?"),
        ],
    )
    .build();
    let adapter = Adapter::new(Platform::ChatGpt);
    let mut session = Session::new(Platform::ChatGpt);

    rescan(&adapter, &doc, &mut session, &EngineConfig::default());
    let first = session.index().as_slice().to_vec();
    let outcome = rescan(&adapter, &doc, &mut session, &EngineConfig::default());

    assert_eq!(session.index().as_slice(), first.as_slice());
    match outcome {
        RescanOutcome::Accepted(diff) => assert!(diff.is_empty()),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_identities_unique_and_serials_dense() {
    let doc = chatgpt_page(
        "dense",
        vec![
            chatgpt_turn("user", "u1", "first question"),
            chatgpt_turn("assistant", "a1", "first answer"),
            chatgpt_turn("user", "u1", "first question"),
            chatgpt_turn("user", "u2", "second question"),
            chatgpt_turn("assistant", "a2", "second answer"),
            chatgpt_turn("user", "u3", "third question"),
        ],
    )
    .build();
    let session = index_of(&doc, Platform::ChatGpt);
    let index = session.index();

    let ids: HashSet<&Identity> = index.iter().map(|m| &m.identity).collect();
    assert_eq!(ids.len(), index.len());
    assert_eq!(index.len(), 5);

    let serials: Vec<u32> = index.iter().filter(|m| m.role == Role::User).filter_map(|m| m.serial).collect();
    assert_eq!(serials, vec![1, 2, 3]);
    assert!(index.iter().filter(|m| m.role == Role::Assistant).all(|m| m.serial.is_none()));
}

#[test]
fn test_duplicate_hello_scenario() {
    let doc = chatgpt_page(
        "hello",
        vec![
            chatgpt_turn("user", "m-1", "Hello?"),
            chatgpt_turn("assistant", "m-2", "Sure, here is..."),
            chatgpt_turn("user", "m-1", "Hello?"),
        ],
    )
    .build();
    let session = index_of(&doc, Platform::ChatGpt);
    let entries = session.index().as_slice();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].role, Role::User);
    assert_eq!(entries[0].preview, "Hello?");
    assert_eq!(entries[0].serial, Some(1));
    assert_eq!(entries[1].role, Role::Assistant);
    assert_eq!(entries[1].serial, None);
}

#[test]
fn test_retention_guard_keeps_previous_index() {
    let adapter = Adapter::new(Platform::ChatGpt);
    let mut session = Session::new(Platform::ChatGpt);
    let full = chatgpt_page("keep", vec![chatgpt_turn("user", "u1", "kept question")]).build();
    rescan(&adapter, &full, &mut session, &EngineConfig::default());
    assert_eq!(session.index().len(), 1);

    // Container present but only a loading placeholder inside.
    let emptied = chatgpt_page("keep", vec![chatgpt_turn("assistant", "a1", "Thinking...")]).build();
    let outcome = rescan(&adapter, &emptied, &mut session, &EngineConfig::default());

    assert_eq!(outcome, RescanOutcome::Retained { kept: 1 });
    assert_eq!(session.index().len(), 1);
    assert_eq!(session.index().as_slice()[0].preview, "kept question");
}

#[test]
fn test_empty_rescan_after_reset_is_accepted() {
    let adapter = Adapter::new(Platform::ChatGpt);
    let mut session = Session::new(Platform::ChatGpt);
    let full = chatgpt_page("a", vec![chatgpt_turn("user", "u1", "question")]).build();
    rescan(&adapter, &full, &mut session, &EngineConfig::default());

    session.reset();
    assert!(session.index().is_empty());
    assert!(session.identities().is_empty());

    let emptied = chatgpt_page("b", vec![chatgpt_turn("assistant", "a1", "Loading...")]).build();
    let outcome = rescan(&adapter, &emptied, &mut session, &EngineConfig::default());
    assert!(matches!(outcome, RescanOutcome::Accepted(_)));
    assert!(session.index().is_empty());
}

#[test]
fn test_image_beats_code_extension() {
    let doc = chatgpt_page(
        "attach",
        vec![
            el("div")
                .attr("data-message-author-role", "user")
                .attr("data-message-id", "u1")
                .child(el("img").attr("src", "blob:https://chatgpt.com/1").size(240, 180))
                .child(el("div").class("markdown").text("please review main.rs")),
        ],
    )
    .build();
    let session = index_of(&doc, Platform::ChatGpt);
    assert_eq!(session.index().as_slice()[0].attachment, AttachmentKind::Image);
}

#[test]
fn test_attachment_kinds_from_text() {
    let doc = chatgpt_page(
        "kinds",
        vec![
            chatgpt_turn("user", "u1", "Summarize report.pdf for me"),
            chatgpt_turn("user", "u2", "What does build.py do?"),
            chatgpt_turn("user", "u3", "Clean up notes.docx please"),
            chatgpt_turn("user", "u4", "Nothing attached here"),
        ],
    )
    .build();
    let session = index_of(&doc, Platform::ChatGpt);
    let kinds: Vec<AttachmentKind> = session.index().iter().map(|m| m.attachment).collect();
    assert_eq!(
        kinds,
        vec![AttachmentKind::Pdf, AttachmentKind::Code, AttachmentKind::Document, AttachmentKind::None]
    );
}

#[test]
fn test_fallback_identity_is_stable_across_rescans() {
    let doc = DocBuilder::new("https://claude.ai/chat/xyz")
        .child(
            el("main")
                .child(el("div").class("font-user-message").text("Why is the sky blue?"))
                .child(el("div").class("font-claude-message").text("Rayleigh scattering.")),
        )
        .build();
    let first = index_of(&doc, Platform::Claude);
    let second = index_of(&doc, Platform::Claude);

    let a: Vec<_> = first.index().iter().map(|m| m.identity.clone()).collect();
    let b: Vec<_> = second.index().iter().map(|m| m.identity.clone()).collect();
    assert_eq!(a, b);
    assert!(a[0].as_str().starts_with("claude-user-0-"));
    assert!(a[1].as_str().starts_with("claude-assistant-1-"));
}

#[test]
fn test_hidden_and_interactive_candidates_dropped() {
    let doc = chatgpt_page(
        "hidden",
        vec![
            chatgpt_turn("user", "u1", "visible question"),
            chatgpt_turn("assistant", "a1", "hidden answer").display("none"),
            el("button").attr("data-message-author-role", "assistant").attr("data-message-id", "b1").text("Regenerate"),
        ],
    )
    .build();
    let draft = collect(&Adapter::new(Platform::ChatGpt), &doc, &EngineConfig::default()).unwrap();
    let ids: Vec<&str> = draft.messages.iter().map(|m| m.identity.as_str()).collect();
    assert_eq!(ids, vec!["u1"]);
}

#[test]
fn test_failed_extraction_drops_only_that_candidate() {
    let doc = chatgpt_page(
        "label-only",
        vec![
            chatgpt_turn("user", "u1", "first question"),
            chatgpt_turn("user", "u2", "You:"),
            chatgpt_turn("assistant", "a1", "an answer"),
            chatgpt_turn("user", "u3", "second question"),
        ],
    )
    .build();
    let adapter = Adapter::new(Platform::ChatGpt);

    let draft = collect(&adapter, &doc, &EngineConfig::default()).unwrap();
    assert_eq!(draft.candidates, 4);
    assert_eq!(draft.dropped, 1);

    let session = index_of(&doc, Platform::ChatGpt);
    let ids: Vec<&str> = session.index().iter().map(|m| m.identity.as_str()).collect();
    assert_eq!(ids, vec!["u1", "a1", "u3"]);
    let serials: Vec<u32> = session.index().iter().filter_map(|m| m.serial).collect();
    assert_eq!(serials, vec![1, 2]);
}

#[test]
fn test_every_platform_indexes_its_basic_layout() {
    let cases = vec![
        (
            Platform::Gemini,
            DocBuilder::new("https://gemini.google.com/app/123").child(
                el("chat-window")
                    .child(el("user-query").child(el("message-content").class("user-query").text("Plan a trip")))
                    .child(
                        el("model-response")
                            .child(el("message-content").class("model-response-text").text("Here is a plan")),
                    ),
            ),
        ),
        (
            Platform::Perplexity,
            DocBuilder::new("https://www.perplexity.ai/search/rust-abc").child(
                el("main")
                    .child(el("div").class("group/query").text("what is rust"))
                    .child(el("div").class("group/answer").text("A systems language.")),
            ),
        ),
        (
            Platform::DeepSeek,
            DocBuilder::new("https://chat.deepseek.com/a/chat/s/42").child(
                el("main")
                    .child(el("div").class("ds-message").attr("data-role", "user").text("hello there"))
                    .child(el("div").class("ds-message").attr("data-role", "assistant").text("Hi! How can I help?")),
            ),
        ),
    ];

    for (platform, page) in cases {
        let doc = page.build();
        let session = index_of(&doc, platform);
        let roles: Vec<Role> = session.index().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant], "platform {}", platform);
        assert_eq!(session.index().as_slice()[0].serial, Some(1), "platform {}", platform);
    }
}
