use super::test_db;
use crate::DisabledTarget;

#[test]
fn test_disabled_set() {
    let db = test_db();
    assert!(!db.is_disabled(DisabledTarget::All).unwrap());

    db.set_disabled(DisabledTarget::All, true).unwrap();
    db.set_disabled(DisabledTarget::Conversation("c1"), true).unwrap();
    // Adding twice is harmless
    db.set_disabled(DisabledTarget::Conversation("c1"), true).unwrap();
    assert!(db.is_disabled(DisabledTarget::All).unwrap());
    assert!(db.is_disabled(DisabledTarget::Conversation("c1")).unwrap());
    assert!(!db.is_disabled(DisabledTarget::Conversation("c2")).unwrap());
    assert_eq!(db.disabled_conversations().unwrap(), vec!["c1"]);

    db.set_disabled(DisabledTarget::Conversation("c1"), false).unwrap();
    assert!(!db.is_disabled(DisabledTarget::Conversation("c1")).unwrap());
    db.set_disabled(DisabledTarget::Conversation("c1"), false).unwrap();
    assert!(db.disabled_conversations().unwrap().is_empty());
    assert!(db.is_disabled(DisabledTarget::All).unwrap());
}

#[test]
fn test_global_switch_is_not_a_conversation_key() {
    let db = test_db();
    db.set_disabled(DisabledTarget::All, true).unwrap();
    assert!(!db.is_disabled(DisabledTarget::Conversation("all")).unwrap());

    // Toggling a conversation literally named "all" leaves the global switch alone
    db.set_disabled(DisabledTarget::Conversation("all"), true).unwrap();
    db.set_disabled(DisabledTarget::Conversation("all"), false).unwrap();
    assert!(db.is_disabled(DisabledTarget::All).unwrap());

    db.set_disabled(DisabledTarget::Conversation(""), true).unwrap();
    db.set_disabled(DisabledTarget::All, false).unwrap();
    assert!(db.is_disabled(DisabledTarget::Conversation("")).unwrap());
    assert!(!db.is_disabled(DisabledTarget::All).unwrap());
}
