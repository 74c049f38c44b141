//! Service providers: batch registration of related entries.

use crate::container::Container;

/// A batch of registrations applied through
/// [`Container::register`](crate::Container::register).
///
/// Providers group the entries, tags, and aliases of one subsystem so
/// applications can assemble a container from parts. Plain closures taking
/// `&Container` are providers too.
///
/// # Examples
///
/// ```rust
/// use canister::{Container, Definition, Entry, Provider};
///
/// struct Mailer {
///     from: String,
/// }
///
/// struct MailProvider;
///
/// impl Provider for MailProvider {
///     fn register(&self, c: &Container) {
///         c.add("mail.from", Entry::value("noreply@example.com".to_string()))
///             .unwrap();
///         c.add("mailer", Definition::new(|c: &Container| {
///             Ok(Mailer {
///                 from: c.get_as::<String>("mail.from")?.as_ref().clone(),
///             })
///         }))
///         .unwrap();
///     }
/// }
///
/// let container = Container::new();
/// container.register(MailProvider);
/// assert_eq!(container.get_as::<Mailer>("mailer").unwrap().from, "noreply@example.com");
/// ```
pub trait Provider {
    /// Registers this provider's entries on the container.
    fn register(&self, container: &Container);
}

impl<F> Provider for F
where
    F: Fn(&Container),
{
    fn register(&self, container: &Container) {
        self(container)
    }
}
