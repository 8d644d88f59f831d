use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gradebook::auth::hash_password;
use gradebook::model::entity::{
    Assessment, AssessmentCreate, Course, CourseCreate, Student, StudentCreate, UserEntity,
    UserEntityCreateUpdate,
};
use gradebook::model::{CrudRepository, DbConnection, ModelManager};
use gradebook::web::{AuthenticatedUser, UserRole};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for filling the gradebook DB", long_about = None)]
pub struct Cli {
    /// Postgres connection string. Falls back to `DATABASE_URL`, then to the config file.
    #[arg(long)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage assessments
    Assessment {
        #[command(subcommand)]
        action: AssessmentCommands,
    },

    /// Manage enrolled students
    Student {
        #[command(subcommand)]
        action: StudentCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
        /// `admin` or `user`
        #[arg(long, default_value = "user")]
        role: String,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        #[arg(long)]
        name: String,
        /// Username of a professor teaching the course, repeatable
        #[arg(long = "professor", required = true)]
        professors: Vec<String>,
    },
}

/// Assessment management
#[derive(Subcommand, Debug)]
pub enum AssessmentCommands {
    Add {
        #[arg(long)]
        course: Uuid,
        #[arg(long)]
        title: String,
        /// Date in `YYYY-MM-DD` form
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value_t = false)]
        submit_multiple: bool,
    },
}

/// Student management
#[derive(Subcommand, Debug)]
pub enum StudentCommands {
    Add {
        #[arg(long)]
        course: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
}

async fn database_url(flag: Option<String>) -> String {
    if let Some(url) = flag.or_else(|| std::env::var("DATABASE_URL").ok()) {
        return url;
    }

    gradebook::Config::get_or_init(true)
        .await
        .app()
        .database_uri()
        .to_string()
}

#[tokio::main]
async fn main() -> gradebook::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let db_con = DbConnection::connect(&database_url(args.database_url).await)?;
    db_con.migrate().await?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add {
                username,
                password,
                email,
                role,
            } => {
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        username,
                        email,
                        password_hash: hash_password(&password)?,
                        role: Some(UserRole::from(role.as_str())),
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add { name, professors } => {
                let professors = UserEntity::ids_by_usernames(&mm, &professors).await?;
                let course = Course::create(&mm, &actor, CourseCreate { name, professors }).await?;
                println!("Course created: {:?}", course);
            }
        },

        Commands::Assessment { action } => match action {
            AssessmentCommands::Add {
                course,
                title,
                date,
                submit_multiple,
            } => {
                let assessment = Assessment::create(
                    &mm,
                    &actor,
                    AssessmentCreate {
                        course_id: course,
                        title,
                        date,
                        submit_multiple,
                    },
                )
                .await?;
                println!("Assessment created: {:?}", assessment);
            }
        },

        Commands::Student { action } => match action {
            StudentCommands::Add {
                course,
                name,
                email,
            } => {
                let student = Student::create(
                    &mm,
                    &actor,
                    StudentCreate {
                        course_id: course,
                        name,
                        email,
                    },
                )
                .await?;
                println!("Student created: {:?}", student);
            }
        },
    }

    Ok(())
}
