use press_portal::{
    auth::AuthUser,
    error::ApiError,
    models::{Article, Category, Role},
    permissions::{self, Action, Decision, Resource, authorize, can},
};
use uuid::Uuid;

fn viewer(username: &str, role: Role) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        role,
    }
}

fn article_by(label: &str) -> Article {
    Article {
        id: Uuid::new_v4(),
        title: "Article A".into(),
        author_label: label.into(),
        ..Default::default()
    }
}

const ALL_ACTIONS: [Action; 14] = [
    Action::CreateCategory,
    Action::UpdateCategory,
    Action::DeleteCategory,
    Action::ListCategories,
    Action::CreateArticle,
    Action::UpdateArticle,
    Action::DeleteArticle,
    Action::ManageArticles,
    Action::ModerateComments,
    Action::GenerateContent,
    Action::UploadImage,
    Action::ToggleLike,
    Action::ManageRoles,
    Action::ViewStats,
];

#[test]
fn test_author_label_scenario() {
    let a = article_by("marie_durand");
    let marie = viewer("marie_durand", Role::Journalist);
    let pierre = viewer("pierre_martin", Role::Journalist);
    let root = viewer("root_admin", Role::Admin);

    assert!(can(Some(&marie), Action::UpdateArticle, Resource::Article(&a)));
    assert!(can(Some(&marie), Action::DeleteArticle, Resource::Article(&a)));
    assert!(!can(Some(&pierre), Action::UpdateArticle, Resource::Article(&a)));
    assert!(!can(Some(&pierre), Action::DeleteArticle, Resource::Article(&a)));
    assert!(can(Some(&root), Action::UpdateArticle, Resource::Article(&a)));
    assert!(can(Some(&root), Action::DeleteArticle, Resource::Article(&a)));
}

#[test]
fn test_author_match_is_case_insensitive_full_equality() {
    let marie = viewer("Marie_Durand", Role::Journalist);

    assert!(can(
        Some(&marie),
        Action::UpdateArticle,
        Resource::Article(&article_by("MARIE_DURAND"))
    ));
    // Prefixes and substrings are not authorship.
    assert!(!can(
        Some(&marie),
        Action::UpdateArticle,
        Resource::Article(&article_by("marie_durand_2"))
    ));
    assert!(!can(
        Some(&marie),
        Action::UpdateArticle,
        Resource::Article(&article_by("marie"))
    ));
}

#[test]
fn test_unicode_labels_match_ignoring_case() {
    let j = viewer("élodie", Role::Journalist);
    assert!(permissions::is_author(&j, &article_by("ÉLODIE")));
}

#[test]
fn test_reader_never_mutates_articles() {
    let reader = viewer("marie_durand", Role::Reader);
    // Even with a matching label.
    for label in ["marie_durand", "someone", ""] {
        let a = article_by(label);
        assert!(!can(Some(&reader), Action::UpdateArticle, Resource::Article(&a)));
        assert!(!can(Some(&reader), Action::DeleteArticle, Resource::Article(&a)));
    }
}

#[test]
fn test_admin_is_allowed_everything() {
    let admin = viewer("root_admin", Role::Admin);
    let a = article_by("anyone");
    let c = Category::default();

    for action in ALL_ACTIONS {
        assert!(can(Some(&admin), action, Resource::Site), "{action:?} on site");
        assert!(can(Some(&admin), action, Resource::Article(&a)), "{action:?} on article");
        assert!(can(Some(&admin), action, Resource::Category(&c)), "{action:?} on category");
    }
}

#[test]
fn test_anonymous_is_unauthenticated_for_every_action() {
    let a = article_by("anyone");
    for action in ALL_ACTIONS {
        assert_eq!(
            authorize(None, action, Resource::Article(&a)),
            Decision::Unauthenticated,
            "{action:?}"
        );
    }
}

#[test]
fn test_reader_and_unknown_roles_only_like() {
    let a = article_by("reader");
    for role in [Role::Reader, Role::Other("editor".into())] {
        let v = viewer("reader", role.clone());
        for action in ALL_ACTIONS {
            let expected = action == Action::ToggleLike;
            assert_eq!(
                can(Some(&v), action, Resource::Article(&a)),
                expected,
                "{role:?} {action:?}"
            );
        }
    }
}

#[test]
fn test_journalist_decision_table() {
    let j = viewer("marie_durand", Role::Journalist);
    let c = Category::default();

    for action in [
        Action::CreateCategory,
        Action::UpdateCategory,
        Action::DeleteCategory,
        Action::ManageRoles,
    ] {
        assert!(!can(Some(&j), action, Resource::Site), "{action:?}");
        assert!(!can(Some(&j), action, Resource::Category(&c)), "{action:?}");
    }
    for action in [
        Action::ListCategories,
        Action::CreateArticle,
        Action::ManageArticles,
        Action::GenerateContent,
        Action::UploadImage,
        Action::ViewStats,
        Action::ToggleLike,
    ] {
        assert!(can(Some(&j), action, Resource::Site), "{action:?}");
    }
}

#[test]
fn test_journalist_moderation_is_scoped_to_own_articles() {
    let j = viewer("marie_durand", Role::Journalist);
    let own = article_by("marie_durand");
    let other = article_by("pierre_martin");

    assert!(can(Some(&j), Action::ModerateComments, Resource::Site));
    assert!(can(Some(&j), Action::ModerateComments, Resource::Article(&own)));
    assert!(!can(Some(&j), Action::ModerateComments, Resource::Article(&other)));
}

#[test]
fn test_require_maps_decisions_to_errors() {
    let a = article_by("marie_durand");
    let pierre = viewer("pierre_martin", Role::Journalist);

    assert_eq!(
        permissions::require(None, Action::UpdateArticle, Resource::Article(&a)),
        Err(ApiError::Unauthenticated)
    );
    assert_eq!(
        permissions::require(Some(&pierre), Action::UpdateArticle, Resource::Article(&a)),
        Err(ApiError::Forbidden)
    );
    assert_eq!(
        permissions::require(Some(&pierre), Action::ToggleLike, Resource::Article(&a)),
        Ok(())
    );
}

#[test]
fn test_capabilities_follow_the_rules() {
    let a = article_by("marie_durand");
    let marie = viewer("marie_durand", Role::Journalist);
    let pierre = viewer("pierre_martin", Role::Journalist);

    let own = permissions::capabilities(Some(&marie), &a);
    assert!(own.can_edit && own.can_delete && own.can_moderate);

    let foreign = permissions::capabilities(Some(&pierre), &a);
    assert!(!foreign.can_edit && !foreign.can_delete && !foreign.can_moderate);

    assert_eq!(permissions::capabilities(None, &a), Default::default());
}

#[test]
fn test_role_parsing() {
    assert_eq!(Role::from_stored("Journaliste"), Role::Journalist);
    assert_eq!(Role::from_stored("ADMIN"), Role::Admin);
    assert_eq!(Role::from_stored("editor"), Role::Other("editor".into()));
    // English aliases are accepted from API callers only.
    assert_eq!(Role::from_input("journalist"), Role::Journalist);
    assert_eq!(Role::from_stored("journalist"), Role::Other("journalist".into()));
    assert_eq!(Role::Reader.name(), "lecteur");
}
