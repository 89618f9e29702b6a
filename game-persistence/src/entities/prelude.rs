pub use super::rooms::Entity as Rooms;
