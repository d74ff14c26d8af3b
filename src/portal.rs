//! Session-driven portal state: login, profile setup and dashboard
//!
//! A [`Portal`] is the explicit state container for one browser-equivalent
//! client. It reacts to [`AuthEvent`]s, loads the profile of the signed-in
//! user and keeps the matching report list. Every failure leaves the state as
//! it was and records a notice for the user.

use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::admin::{AdminPanel, ReportFile, MSG_UPLOADED};
use crate::auth::{AuthEvent, Session, User, NOTICE_SIGNED_IN};
use crate::error::Error;
use crate::profile::{Profile, ProfileStore};
use crate::reports::{Report, ReportRegistry};
use crate::LabDesk;

/// Where the user stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalState {
    Anonymous,
    AuthenticatedNoProfile,
    AuthenticatedWithProfile,
}

/// What to render for the current state
#[derive(Debug)]
pub enum PortalView<'p> {
    Login,
    ProfileSetup {
        user: &'p User,
    },
    Dashboard {
        profile: &'p Profile,
        reports: &'p [Report],
        /// Whether to show the upload panel; the data store has the final word
        show_admin_panel: bool,
    },
}

/// Everything that only exists while someone is signed in
struct SignedIn {
    session: Session,
    profile: Option<Profile>,
    profiles: ProfileStore,
    registry: ReportRegistry,
    admin: AdminPanel,
}

/// State container for the authenticated part of the site
pub struct Portal<'a> {
    desk: &'a LabDesk,
    signed_in: Option<SignedIn>,
    notice: Option<String>,
}

impl<'a> Portal<'a> {
    pub fn new(desk: &'a LabDesk) -> Self {
        Self {
            desk,
            signed_in: None,
            notice: None,
        }
    }

    pub fn state(&self) -> PortalState {
        match &self.signed_in {
            None => PortalState::Anonymous,
            Some(s) if s.profile.is_none() => PortalState::AuthenticatedNoProfile,
            Some(_) => PortalState::AuthenticatedWithProfile,
        }
    }

    pub fn view(&self) -> PortalView<'_> {
        match &self.signed_in {
            None => PortalView::Login,
            Some(SignedIn { session, profile: None, .. }) => PortalView::ProfileSetup { user: &session.user },
            Some(SignedIn { profile: Some(profile), registry, .. }) => PortalView::Dashboard {
                profile,
                reports: registry.reports(),
                show_admin_panel: profile.is_admin,
            },
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.signed_in.as_ref().map(|s| &s.session)
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.signed_in.as_ref().and_then(|s| s.profile.as_ref())
    }

    pub fn reports(&self) -> &[Report] {
        self.signed_in
            .as_ref()
            .map(|s| s.registry.reports())
            .unwrap_or(&[])
    }

    /// Last message for the user, if any
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Apply one session change.
    ///
    /// A sign-in only replaces the current state once the profile lookup has
    /// answered. If it fails, the previous view stays; a renewed session for
    /// the user already signed in is still taken so later calls carry the new
    /// token.
    pub async fn handle(&mut self, event: AuthEvent) -> Result<(), Error> {
        match event {
            AuthEvent::SignedIn(session) => {
                if session.is_expired() {
                    log::warn!("Ignoring expired session for user {}", session.user.id);
                    return Err(self.fail(Error::NotAuthenticated));
                }

                let mut next = self.open(session);
                let loaded = next.profiles.load(&next.session).await;
                let profile = match loaded {
                    Ok(profile) => profile,
                    Err(err) => {
                        let user_id = next.session.user.id.clone();
                        if let Some(current) = self.signed_in.as_mut().filter(|c| c.session.user.id == user_id) {
                            next.profile = current.profile.take();
                            next.registry.carry_over(&mut current.registry);
                            *current = next;
                        }
                        return Err(self.fail(err));
                    }
                };

                self.notice = Some(NOTICE_SIGNED_IN.to_string());
                match profile {
                    Some(profile) => {
                        log::info!("Profile found for user {}", profile.uid);
                        next.profile = Some(profile);
                        self.signed_in = Some(next);
                        self.refresh_reports().await
                    }
                    None => {
                        log::info!("User {} has no profile yet", next.session.user.id);
                        self.signed_in = Some(next);
                        Ok(())
                    }
                }
            }
            AuthEvent::SignInFailed(reason) => {
                self.notice = Some(reason);
                Ok(())
            }
            AuthEvent::SignedOut => {
                log::info!("Portal back to login");
                self.signed_in = None;
                self.notice = None;
                Ok(())
            }
        }
    }

    /// Apply every event waiting on `events`.
    ///
    /// If the receiver fell behind, the current session of the auth client is
    /// taken as the truth instead of the missed events.
    pub async fn sync(&mut self, events: &mut broadcast::Receiver<AuthEvent>) -> Result<usize, Error> {
        let mut applied = 0;
        loop {
            let event = match events.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("Missed {} auth events, resyncing", skipped);
                    match self.desk.auth().get_session() {
                        Some(session) => AuthEvent::SignedIn(session),
                        None => AuthEvent::SignedOut,
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return Ok(applied),
            };
            self.handle(event).await?;
            applied += 1;
        }
    }

    fn open(&self, session: Session) -> SignedIn {
        let options = self.desk.options();
        let token = Some(session.access_token.as_str());

        SignedIn {
            profiles: ProfileStore::new(self.desk.from(&options.users_table).with_auth(token)),
            registry: ReportRegistry::new(self.desk.from(&options.reports_table).with_auth(token)),
            admin: AdminPanel::new(
                self.desk.storage().with_auth(token),
                &options.reports_bucket,
                self.desk.from(&options.reports_table).with_auth(token),
            ),
            session,
            profile: None,
        }
    }

    /// Fail with a notice unless a signed-in, unexpired session is held
    fn check_session(&mut self) -> Result<(), Error> {
        match self.session().map(Session::is_expired) {
            None => Err(self.fail(Error::NotAuthenticated)),
            Some(true) => {
                log::warn!("Session expired, sign in again");
                Err(self.fail(Error::NotAuthenticated))
            }
            Some(false) => Ok(()),
        }
    }

    /// Complete profile setup, then load the reports for the saved phone
    pub async fn save_profile(&mut self, name: &str, phone: &str) -> Result<&Profile, Error> {
        self.check_session()?;
        let signed_in = match self.signed_in.as_mut() {
            Some(signed_in) => signed_in,
            None => return Err(self.fail(Error::NotAuthenticated)),
        };

        let saved = signed_in.profiles.save(Some(&signed_in.session), name, phone).await;
        match saved {
            Ok(profile) => signed_in.profile = Some(profile),
            Err(err) => return Err(self.fail(err)),
        }

        self.refresh_reports().await?;
        self.profile().ok_or(Error::NotAuthenticated)
    }

    /// Reload the report list for the current profile's phone
    pub async fn refresh_reports(&mut self) -> Result<(), Error> {
        self.check_session()?;
        let signed_in = self.signed_in.as_mut().ok_or(Error::NotAuthenticated)?;
        let phone = match &signed_in.profile {
            Some(profile) => profile.phone.clone(),
            None => return Ok(()),
        };

        let fetched = signed_in.registry.fetch(&phone).await.map(|_| ());
        fetched.map_err(|err| self.fail(err))
    }

    /// Upload a report for `phone` from the admin panel.
    ///
    /// Refused unless the profile carries the admin flag. When the phone is
    /// the viewer's own, their list is reloaded.
    pub async fn upload_report(&mut self, phone: &str, file: Option<&ReportFile>) -> Result<Report, Error> {
        self.check_session()?;
        let signed_in = match self.signed_in.as_ref() {
            Some(signed_in) => signed_in,
            None => return Err(self.fail(Error::NotAuthenticated)),
        };
        let own_phone = match &signed_in.profile {
            Some(profile) if profile.is_admin => profile.phone.clone(),
            _ => return Err(self.fail(Error::Forbidden("admin access required".to_string()))),
        };

        let uploaded = signed_in.admin.upload(phone, file).await;
        let report = uploaded.map_err(|err| self.fail(err))?;
        self.notice = Some(MSG_UPLOADED.to_string());

        if phone == own_phone {
            self.refresh_reports().await?;
        }

        Ok(report)
    }

    /// Sign out with the session this portal holds and return to the login view.
    ///
    /// The portal's own token is used, so this works even when the auth
    /// client does not keep sessions.
    pub async fn sign_out(&mut self) -> Result<(), Error> {
        let token = match self.session() {
            Some(session) => Some(session.access_token.clone()),
            None => self.desk.auth().access_token(),
        };
        let token = match token {
            Some(token) => token,
            None => return Err(self.fail(Error::NotAuthenticated)),
        };

        if let Err(err) = self.desk.auth().sign_out_token(&token).await {
            return Err(self.fail(err));
        }
        self.handle(AuthEvent::SignedOut).await
    }

    fn fail(&mut self, err: Error) -> Error {
        log::warn!("Portal operation failed: {}", err);
        self.notice = Some(err.user_message());
        err
    }
}
