mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod group;
pub use group::{Group, GroupCreate};

mod course;
pub use course::{Course, CourseCreate, CourseFilter, CourseOrder};

mod assessment;
pub use assessment::{Assessment, AssessmentCreate, AssessmentFilter, AssessmentOrder};

mod student;
pub use student::{Student, StudentCreate, StudentFilter};

mod result;
pub use result::{AssessmentResult, AssessmentResultCreate, ResultFilter, ResultOrder};
