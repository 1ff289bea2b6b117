use pm_portal::{
    AllowList, Role, UserIdentity,
    models::{ProfileRow, RoleParseError},
};
use uuid::Uuid;

#[test]
fn test_role_wire_format_is_snake_case() {
    assert_eq!(serde_json::to_string(&Role::BusinessOwner).unwrap(), "\"business_owner\"");
    assert_eq!(
        serde_json::from_str::<Role>("\"project_manager\"").unwrap(),
        Role::ProjectManager
    );
    for role in Role::ALL {
        assert_eq!(serde_json::to_string(&role).unwrap(), format!("\"{}\"", role.as_str()));
    }
}

#[test]
fn test_role_parsing_accepts_frontend_spellings() {
    assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
    assert_eq!("business-owner".parse::<Role>().unwrap(), Role::BusinessOwner);
    assert_eq!("BusinessOwner".parse::<Role>().unwrap(), Role::BusinessOwner);
    assert_eq!("ProjectManager".parse::<Role>().unwrap(), Role::ProjectManager);
    assert_eq!("pm".parse::<Role>().unwrap(), Role::ProjectManager);
    assert_eq!(" member ".parse::<Role>().unwrap(), Role::Member);
}

#[test]
fn test_unknown_role_is_rejected() {
    assert_eq!(
        "superuser".parse::<Role>(),
        Err(RoleParseError("superuser".to_string()))
    );
    assert!(serde_json::from_str::<Role>("\"student\"").is_err());
}

#[test]
fn test_role_dashboards() {
    assert_eq!(Role::Admin.dashboard_path(), Some("/dashboard/admin"));
    assert_eq!(Role::BusinessOwner.dashboard_path(), Some("/dashboard/business"));
    assert_eq!(Role::Member.dashboard_path(), Some("/dashboard/member"));
    assert_eq!(Role::ProjectManager.dashboard_path(), Some("/dashboard/pm"));
    assert_eq!(Role::User.dashboard_path(), None);
}

#[test]
fn test_profile_row_conversion_validates_role() {
    let id = Uuid::new_v4();
    let row = ProfileRow {
        id,
        email: "owner@example.com".to_string(),
        role: "business_owner".to_string(),
    };
    let user = UserIdentity::try_from(row).unwrap();
    assert_eq!(user.user_id, id);
    assert_eq!(user.role, Role::BusinessOwner);

    let bad = ProfileRow {
        id,
        email: "x@example.com".to_string(),
        role: "root".to_string(),
    };
    assert!(UserIdentity::try_from(bad).is_err());
}

#[test]
fn test_user_identity_json_shape() {
    let user = UserIdentity {
        user_id: Uuid::from_u128(9),
        email: "m@example.com".to_string(),
        role: Role::Member,
    };
    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["userId"], Uuid::from_u128(9).to_string());
    assert_eq!(json["role"], "member");
}

#[test]
fn test_allow_list_membership() {
    let only_admin = AllowList::only(Role::Admin);
    assert!(only_admin.contains(Role::Admin));
    assert!(!only_admin.contains(Role::Member));

    let empty = AllowList::default();
    assert!(empty.is_empty());
    assert!(Role::ALL.iter().all(|r| !empty.contains(*r)));

    let collected: AllowList = [Role::Member, Role::Member, Role::User].into_iter().collect();
    assert_eq!(collected.iter().count(), 2);
}
