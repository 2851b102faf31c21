//! User administration and sign-in

use super::{logged, AuditNote, PlacementEngine};
use crate::audit::ActionType;
use crate::core::error::{HivekeepError, Result};
use crate::core::types::{EntityType, UserId};
use crate::entity::{NewUser, User, UserStatus};
use crate::store::StoreOp;

impl PlacementEngine {
    /// Sign in a known, active user by username (any ASCII case)
    pub fn sign_in(&mut self, username: &str) -> Result<()> {
        let user = self
            .yard
            .find_user(username)
            .cloned()
            .ok_or_else(|| HivekeepError::not_found(EntityType::User, username));
        logged("sign_in", user.and_then(|user| self.set_actor(Some(user))))
    }

    /// Add an active account (admin only)
    pub fn create_user(&mut self, new: NewUser) -> Result<UserId> {
        logged("create_user", self.try_create_user(new))
    }

    fn try_create_user(&mut self, new: NewUser) -> Result<UserId> {
        self.require_admin("create users")?;
        let username = new.username.trim();
        if username.is_empty() || username.contains(char::is_whitespace) {
            return Err(HivekeepError::InvalidAttribute(format!(
                "invalid username '{}'",
                new.username
            )));
        }
        if new.name.trim().is_empty() {
            return Err(HivekeepError::InvalidAttribute(
                "user name must not be empty".into(),
            ));
        }
        if self.yard.find_user(username).is_some() {
            return Err(HivekeepError::InvalidAttribute(format!(
                "username {} is taken",
                username
            )));
        }

        let user = User::new(username, new.name.trim(), new.role);
        let id = user.id;
        let note = AuditNote::new(
            EntityType::User,
            id,
            ActionType::Create,
            format!("Created user {} ({})", user.username, user.role),
        );
        self.commit(vec![StoreOp::CreateUser(user)], Some(note))?;
        Ok(id)
    }

    /// Change an account's status (admin only)
    ///
    /// Setting the status a user already has is a no-op. The signed-in user
    /// cannot lock themselves out.
    pub fn set_user_status(&mut self, id: UserId, status: UserStatus) -> Result<()> {
        logged("set_user_status", self.try_set_user_status(id, status))
    }

    fn try_set_user_status(&mut self, id: UserId, status: UserStatus) -> Result<()> {
        self.require_admin("change user status")?;
        let user = self
            .yard
            .user(id)
            .ok_or_else(|| HivekeepError::not_found(EntityType::User, id))?;
        if user.status == status {
            return Ok(());
        }
        if status != UserStatus::Active && self.actor.as_ref().is_some_and(|a| a.id == id) {
            return Err(HivekeepError::InvalidTarget(
                "cannot change the status of the signed-in user".into(),
            ));
        }

        let note = AuditNote::new(
            EntityType::User,
            id,
            ActionType::Update,
            format!("Changed status to {}", status),
        );
        self.commit(vec![StoreOp::SetUserStatus { id, status }], Some(note))
    }

    /// Active users become Disabled; everyone else becomes Active
    pub fn toggle_user_status(&mut self, id: UserId) -> Result<UserStatus> {
        let current = self.yard.user(id).map(|u| u.status);
        let next = match current {
            Some(UserStatus::Active) => UserStatus::Disabled,
            _ => UserStatus::Active,
        };
        self.set_user_status(id, next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use crate::audit::ActionType;
    use crate::core::clock::FixedClock;
    use crate::core::config::EngineConfig;
    use crate::core::error::HivekeepError;
    use crate::core::types::{EntityType, UserId};
    use crate::engine::PlacementEngine;
    use crate::entity::{NewUser, Role, User, UserStatus};
    use crate::state::Yard;
    use chrono::NaiveDate;

    fn setup() -> (PlacementEngine, User) {
        let admin = User::new("marta", "Marta", Role::Admin);
        let yard = Yard::new().with_users(vec![admin.clone()]);
        let engine = PlacementEngine::new(yard, EngineConfig::default())
            .unwrap()
            .with_clock(FixedClock::on(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()));
        (engine, admin)
    }

    #[test]
    fn test_create_user() {
        let (mut engine, _) = setup();
        engine.sign_in("Marta").unwrap();

        let id = engine
            .create_user(NewUser::new(" luis ", "Luis Pérez", Role::Beekeeper))
            .unwrap();
        let user = engine.yard().user(id).unwrap();
        assert_eq!(user.username, "luis");
        assert_eq!(user.status, UserStatus::Active);

        let entry = engine.audit_log().last().unwrap();
        assert_eq!(entry.entity_type, EntityType::User);
        assert_eq!(entry.action, ActionType::Create);
        assert_eq!(entry.details, "Created user luis (beekeeper)");
        assert_eq!(entry.performed_by, "Marta");
    }

    #[test]
    fn test_create_user_validation() {
        let (mut engine, _) = setup();

        for new in [
            NewUser::new("MARTA", "Otra Marta", Role::Beekeeper),
            NewUser::new("  ", "Nadie", Role::Beekeeper),
            NewUser::new("ana maria", "Ana", Role::Beekeeper),
            NewUser::new("ana", " ", Role::Beekeeper),
        ] {
            assert!(matches!(
                engine.create_user(new),
                Err(HivekeepError::InvalidAttribute(_))
            ));
        }
        assert_eq!(engine.yard().users().len(), 1);
        assert!(engine.audit_log().is_empty());
    }

    #[test]
    fn test_beekeeper_cannot_manage_users() {
        let (mut engine, admin) = setup();
        let luis = engine
            .create_user(NewUser::new("luis", "Luis", Role::Beekeeper))
            .unwrap();
        engine.sign_in("luis").unwrap();
        let audit_len = engine.audit_log().len();

        assert!(matches!(
            engine.create_user(NewUser::new("ana", "Ana", Role::Admin)),
            Err(HivekeepError::PermissionDenied(_))
        ));
        assert!(matches!(
            engine.set_user_status(admin.id, UserStatus::Disabled),
            Err(HivekeepError::PermissionDenied(_))
        ));
        assert_eq!(engine.yard().user(luis).unwrap().status, UserStatus::Active);
        assert_eq!(engine.audit_log().len(), audit_len);
    }

    #[test]
    fn test_set_user_status() {
        let (mut engine, _) = setup();
        engine.sign_in("marta").unwrap();
        let luis = engine
            .create_user(NewUser::new("luis", "Luis", Role::Beekeeper))
            .unwrap();

        engine.set_user_status(luis, UserStatus::Disabled).unwrap();
        assert_eq!(engine.yard().user(luis).unwrap().status, UserStatus::Disabled);
        let entry = engine.audit_log().last().unwrap();
        assert_eq!(entry.action, ActionType::Update);
        assert_eq!(entry.entity_id, luis.to_string());
        assert_eq!(entry.details, "Changed status to Disabled");

        // Same status again changes nothing
        let audit_len = engine.audit_log().len();
        engine.set_user_status(luis, UserStatus::Disabled).unwrap();
        assert_eq!(engine.audit_log().len(), audit_len);

        assert!(matches!(
            engine.sign_in("luis"),
            Err(HivekeepError::PermissionDenied(_))
        ));
        assert!(matches!(
            engine.set_user_status(UserId::new(), UserStatus::Active),
            Err(HivekeepError::NotFound { kind: EntityType::User, .. })
        ));
    }

    #[test]
    fn test_toggle_user_status() {
        let (mut engine, _) = setup();
        let luis = engine
            .create_user(NewUser::new("luis", "Luis", Role::Beekeeper))
            .unwrap();

        assert_eq!(engine.toggle_user_status(luis).unwrap(), UserStatus::Disabled);
        assert_eq!(engine.toggle_user_status(luis).unwrap(), UserStatus::Active);
        assert_eq!(
            engine.audit_log().last().unwrap().details,
            "Changed status to Active"
        );
    }

    #[test]
    fn test_admin_cannot_disable_themselves() {
        let (mut engine, admin) = setup();
        engine.sign_in("marta").unwrap();

        assert!(matches!(
            engine.set_user_status(admin.id, UserStatus::Disabled),
            Err(HivekeepError::InvalidTarget(_))
        ));
        assert!(engine.yard().user(admin.id).unwrap().is_active());
    }

    #[test]
    fn test_sign_in_unknown_user() {
        let (mut engine, _) = setup();
        assert!(matches!(
            engine.sign_in("nadie"),
            Err(HivekeepError::NotFound { kind: EntityType::User, .. })
        ));
        assert!(engine.actor().is_none());
    }
}
