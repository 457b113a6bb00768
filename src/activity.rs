use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::Serialize;

use crate::rosterd::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    /// Signup order is preserved; an email appears at most once.
    pub participants: Vec<String>,
}

/// The activity catalog, keyed by activity name. Seeded at startup,
/// then mutated only through signup/unregister. Each check-then-mutate
/// runs under one write lock so concurrent requests can't race past
/// the duplicate/membership checks.
#[derive(Debug)]
pub struct Catalog {
    activities: RwLock<BTreeMap<String, Activity>>,
}

impl Catalog {
    pub fn new(activities: BTreeMap<String, Activity>) -> Self {
        Self {
            activities: RwLock::new(activities),
        }
    }

    pub fn seeded() -> Self {
        let activities = [
            seed(
                "Chess Club",
                "Learn strategies and compete in chess tournaments",
                "Fridays, 3:30 PM - 5:00 PM",
                12,
                &["michael@mergington.edu", "daniel@mergington.edu"],
            ),
            seed(
                "Programming Class",
                "Learn programming fundamentals and build software projects",
                "Tuesdays and Thursdays, 3:30 PM - 4:30 PM",
                20,
                &["emma@mergington.edu", "sophia@mergington.edu"],
            ),
            seed(
                "Gym Class",
                "Physical education and sports activities",
                "Mondays, Wednesdays, Fridays, 2:00 PM - 3:00 PM",
                30,
                &["john@mergington.edu", "olivia@mergington.edu"],
            ),
            seed(
                "Soccer Team",
                "Join the school soccer team and compete in matches",
                "Tuesdays and Thursdays, 4:00 PM - 5:30 PM",
                22,
                &["liam@mergington.edu", "noah@mergington.edu"],
            ),
            seed(
                "Basketball Team",
                "Practice and play basketball with the school team",
                "Wednesdays and Fridays, 3:30 PM - 5:00 PM",
                15,
                &["ava@mergington.edu", "mia@mergington.edu"],
            ),
            seed(
                "Art Club",
                "Explore your creativity through painting and drawing",
                "Thursdays, 3:30 PM - 5:00 PM",
                15,
                &["amelia@mergington.edu", "harper@mergington.edu"],
            ),
            seed(
                "Drama Club",
                "Act, direct, and produce plays and performances",
                "Mondays and Wednesdays, 4:00 PM - 5:30 PM",
                20,
                &["ella@mergington.edu", "scarlett@mergington.edu"],
            ),
            seed(
                "Math Club",
                "Solve challenging problems and participate in math competitions",
                "Tuesdays, 3:30 PM - 4:30 PM",
                10,
                &["james@mergington.edu", "benjamin@mergington.edu"],
            ),
            seed(
                "Debate Team",
                "Develop public speaking and argumentation skills",
                "Fridays, 4:00 PM - 5:30 PM",
                12,
                &["charlotte@mergington.edu", "henry@mergington.edu"],
            ),
        ];

        Self::new(activities.into_iter().collect())
    }

    /// Full copy of the current state. Callers get their own data,
    /// so nothing they do with it can bypass the mutation checks.
    pub fn snapshot(&self) -> BTreeMap<String, Activity> {
        self.activities.read().clone()
    }

    // max_participants is stored but deliberately not checked here,
    // matching the behaviour the web client already relies on.
    pub fn signup(&self, name: &str, email: &str) -> Result<()> {
        let mut activities = self.activities.write();

        let activity = activities.get_mut(name).ok_or(Error::NotFound)?;

        if activity.participants.iter().any(|p| p == email) {
            return Err(Error::Conflict("Student is already signed up"));
        }

        activity.participants.push(email.into());
        Ok(())
    }

    pub fn unregister(&self, name: &str, email: &str) -> Result<()> {
        let mut activities = self.activities.write();

        let activity = activities.get_mut(name).ok_or(Error::NotFound)?;

        let position = activity
            .participants
            .iter()
            .position(|p| p == email)
            .ok_or(Error::Conflict("Student is not signed up for this activity"))?;

        activity.participants.remove(position);
        Ok(())
    }
}

fn seed(
    name: &str,
    description: &str,
    schedule: &str,
    max_participants: u32,
    participants: &[&str],
) -> (String, Activity) {
    (
        name.into(),
        Activity {
            description: description.into(),
            schedule: schedule.into(),
            max_participants,
            participants: participants.iter().map(|&p| p.into()).collect(),
        },
    )
}
