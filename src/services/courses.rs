// src/services/courses.rs

//! Course catalogue, purchases and sequential lesson unlocking.

use crate::models::course::{
    CompletedLessons, Course, CourseModule, CourseProgress, CreateCourseRequest, Lesson,
    LessonStatus,
};

const PLACEHOLDER_VIDEO: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

fn lesson(id: i64, title: &str, duration: &str) -> Lesson {
    Lesson {
        id,
        title: title.to_string(),
        duration: duration.to_string(),
        video_url: PLACEHOLDER_VIDEO.to_string(),
    }
}

/// Catalogue written on first start.
pub fn seed_catalog() -> Vec<Course> {
    vec![
        Course {
            id: 1,
            title: "Web Development Bootcamp".into(),
            description: "Learn full-stack web development from scratch".into(),
            instructor: "John Smith".into(),
            duration: "12 weeks".into(),
            level: "beginner".into(),
            is_paid: false,
            price: 0.0,
            thumbnail: "https://via.placeholder.com/800x400".into(),
            modules: vec![
                CourseModule {
                    id: 1,
                    title: "Introduction to HTML".into(),
                    duration: "2 hours".into(),
                    lessons: vec![
                        lesson(101, "What is HTML?", "30 mins"),
                        lesson(102, "HTML Structure", "1 hour"),
                    ],
                },
                CourseModule {
                    id: 2,
                    title: "CSS Fundamentals".into(),
                    duration: "3 hours".into(),
                    lessons: vec![
                        lesson(201, "CSS Selectors", "45 mins"),
                        lesson(202, "CSS Box Model", "1.5 hours"),
                    ],
                },
                CourseModule {
                    id: 3,
                    title: "JavaScript Basics".into(),
                    duration: "4 hours".into(),
                    lessons: vec![
                        lesson(301, "JS Variables", "1 hour"),
                        lesson(302, "JS Data Types", "1 hour"),
                        lesson(303, "JS Functions", "2 hours"),
                    ],
                },
            ],
        },
        Course {
            id: 2,
            title: "Data Science Fundamentals".into(),
            description: "Master data analysis and machine learning".into(),
            instructor: "Jane Smith".into(),
            duration: "10 weeks".into(),
            level: "intermediate".into(),
            is_paid: true,
            price: 3499.0,
            thumbnail: "https://via.placeholder.com/800x400".into(),
            modules: vec![CourseModule {
                id: 4,
                title: "Introduction to Data Science".into(),
                duration: "3 hours".into(),
                lessons: vec![
                    lesson(401, "What is Data Science?", "1 hour"),
                    lesson(402, "Data Analysis Tools", "2 hours"),
                ],
            }],
        },
    ]
}

/// Builds a stored course from an admin request. Module ids are
/// `id * 100 + n`, lesson ids `module_id * 100 + n`.
pub fn build_course(id: i64, req: CreateCourseRequest) -> Course {
    let modules = req
        .modules
        .into_iter()
        .enumerate()
        .map(|(m, module)| {
            let module_id = id * 100 + m as i64 + 1;
            CourseModule {
                id: module_id,
                title: module.title,
                duration: module.duration,
                lessons: module
                    .lessons
                    .into_iter()
                    .enumerate()
                    .map(|(l, lesson)| Lesson {
                        id: module_id * 100 + l as i64 + 1,
                        title: lesson.title,
                        duration: lesson.duration,
                        video_url: lesson.video_url,
                    })
                    .collect(),
            }
        })
        .collect();

    Course {
        id,
        title: req.title,
        description: req.description,
        instructor: req.instructor,
        duration: req.duration,
        level: req.level,
        is_paid: req.is_paid,
        price: if req.is_paid { req.price } else { 0.0 },
        thumbnail: req.thumbnail,
        modules,
    }
}

/// (module index, lesson index) of a lesson.
pub fn locate_lesson(course: &Course, lesson_id: i64) -> Option<(usize, usize)> {
    course.modules.iter().enumerate().find_map(|(m, module)| {
        module
            .lessons
            .iter()
            .position(|l| l.id == lesson_id)
            .map(|l| (m, l))
    })
}

fn is_completed(completed: &CompletedLessons, lesson_id: i64) -> bool {
    completed.get(&lesson_id).copied().unwrap_or(false)
}

/// A lesson opens once the previous lesson of its module and every lesson of
/// earlier modules are complete. Paid courses stay locked until purchased.
pub fn is_lesson_accessible(
    course: &Course,
    purchased: bool,
    completed: &CompletedLessons,
    module_index: usize,
    lesson_index: usize,
) -> bool {
    if course.is_paid && !purchased {
        return false;
    }
    if module_index == 0 && lesson_index == 0 {
        return true;
    }

    if lesson_index > 0 {
        let previous = course
            .modules
            .get(module_index)
            .and_then(|m| m.lessons.get(lesson_index - 1));
        if previous.is_some_and(|l| !is_completed(completed, l.id)) {
            return false;
        }
    }

    course.modules[..module_index.min(course.modules.len())]
        .iter()
        .flat_map(|m| m.lessons.iter())
        .all(|l| is_completed(completed, l.id))
}

/// Rounded share of completed lessons.
pub fn progress_percent(course: &Course, completed: &CompletedLessons) -> u32 {
    let total = course.lesson_count();
    if total == 0 {
        return 0;
    }
    let done = course
        .modules
        .iter()
        .flat_map(|m| m.lessons.iter())
        .filter(|l| is_completed(completed, l.id))
        .count();
    ((done as f64 / total as f64) * 100.0).round() as u32
}

pub fn course_progress(course: &Course, purchased: bool, completed: &CompletedLessons) -> CourseProgress {
    let mut lessons = Vec::with_capacity(course.lesson_count());
    for (m, module) in course.modules.iter().enumerate() {
        for (l, lesson) in module.lessons.iter().enumerate() {
            lessons.push(LessonStatus {
                id: lesson.id,
                title: lesson.title.clone(),
                completed: is_completed(completed, lesson.id),
                accessible: is_lesson_accessible(course, purchased, completed, m, l),
            });
        }
    }

    CourseProgress {
        course_id: course.id,
        purchased,
        progress: progress_percent(course, completed),
        completed_count: lessons.iter().filter(|l| l.completed).count(),
        total_lessons: lessons.len(),
        lessons,
    }
}
