pub mod entities;
pub mod requests;

pub use entities::{
    Child, Donation, Goal, GoalProgressEntry, GoalStatus, ProgressNote, Role, Session, User,
    Validate, Visibility,
};
pub use requests::{
    DonationsSummaryQuery, EmailWeeklyReportRequest, GoalsProgressPatch, ListChildrenQuery,
    ListDonationsQuery, ListGoalsQuery, ListProgressNotesQuery, ListSessionsQuery, ListUsersQuery,
    LoginRequest, SignupRequest, WeeklyReportQuery,
};
