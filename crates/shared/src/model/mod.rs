mod role;

pub use self::role::UserRole;
