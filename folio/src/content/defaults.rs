//! Seed content served before anything has been persisted.

use super::{ContactInfo, Cv, Highlight, JourneyStep, Profile, ProfileTag, Project, ProjectStats, Skill, Snapshot, Stat};

pub fn seed() -> Snapshot {
    Snapshot {
        profile: profile(),
        skills: skills(),
        projects: projects(),
        contact: contact(),
        cv: cv(),
        stats: stats(),
        highlights: highlights(),
        journey: journey(),
    }
}

pub fn profile() -> Profile {
    Profile {
        name: "Krishna Deshmukh".into(),
        title: "Java Full Stack Developer".into(),
        tagline: "I'm a Fresher Java Full Stack Developer skilled in building scalable web applications with modern technologies."
            .into(),
        bio: "I'm a passionate Fresher specializing in Java Full Stack Development. With a strong foundation in modern \
              technologies, I'm eager to contribute to innovative projects and grow in the tech industry."
            .into(),
        location: "Mumbai, India".into(),
        profile_image: "/placeholder.svg?height=320&width=320&text=Krishna+Deshmukh".into(),
        skills: ["Java", "Spring Boot", "React", "Node.js"].map(String::from).to_vec(),
        tags: vec![
            tag("☕ Java Full Stack Developer", "from-blue-400", "to-green-400"),
            tag("🚀 Spring Boot Expert", "from-green-400", "to-blue-400"),
            tag("⚛️ React Developer", "from-blue-400", "to-purple-400"),
            tag("🌟 Fresher & Eager to Learn", "from-purple-400", "to-blue-400"),
        ],
    }
}

fn tag(text: &str, gradient_start: &str, gradient_end: &str) -> ProfileTag {
    ProfileTag {
        text: text.into(),
        gradient_start: gradient_start.into(),
        gradient_end: gradient_end.into(),
    }
}

pub fn skills() -> Vec<Skill> {
    [
        ("Java", 85, "☕", "Programming"),
        ("Spring Boot", 80, "🍃", "Framework"),
        ("Data JPA", 75, "🗄️", "Framework"),
        ("React", 85, "⚛️", "Frontend"),
        ("Node.js", 75, "🟢", "Backend"),
        ("Express", 70, "🚀", "Backend"),
        ("HTML", 90, "🏗️", "Frontend"),
        ("CSS", 85, "🎨", "Frontend"),
        ("JavaScript", 80, "🟨", "Programming"),
        ("Tailwind CSS", 85, "🌊", "Frontend"),
        ("SQL", 75, "🗃️", "Database"),
        ("MongoDB", 70, "🍃", "Database"),
        ("Supabase", 65, "⚡", "Database"),
        ("Git", 80, "🔄", "Tools"),
        ("GitHub", 85, "🐙", "Tools"),
        ("Postman", 75, "📮", "Tools"),
        ("v0.dev", 70, "🤖", "AI Tools"),
        ("Lovable.dev", 65, "💝", "AI Tools"),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (name, level, icon, category))| Skill {
        id: (i + 1).to_string(),
        name: name.into(),
        level,
        icon: icon.into(),
        category: category.into(),
    })
    .collect()
}

struct ProjectSeed {
    title: &'static str,
    description: &'static str,
    image_text: &'static str,
    technologies: [&'static str; 5],
    demo_url: &'static str,
    code_url: &'static str,
    featured: bool,
    category: &'static str,
    stars: u32,
    views: &'static str,
}

const PROJECTS: [ProjectSeed; 5] = [
    ProjectSeed {
        title: "Real Estate Project",
        description: "A comprehensive real estate platform with property listings, search functionality, and user management built with modern full-stack technologies.",
        image_text: "Real+Estate+Platform",
        technologies: ["Java", "Spring Boot", "React", "MongoDB", "Tailwind CSS"],
        demo_url: "https://your-real-estate-demo.vercel.app",
        code_url: "https://github.com/yourusername/real-estate-project",
        featured: true,
        category: "Full Stack",
        stars: 45,
        views: "1.2k",
    },
    ProjectSeed {
        title: "React To-Do App with Animation",
        description: "An interactive to-do application featuring smooth animations, drag-and-drop functionality, and local storage persistence.",
        image_text: "Animated+Todo+App",
        technologies: ["React", "Framer Motion", "JavaScript", "CSS3", "Local Storage"],
        demo_url: "https://your-todo-app.netlify.app",
        code_url: "https://github.com/yourusername/todo-app",
        featured: true,
        category: "Frontend",
        stars: 32,
        views: "890",
    },
    ProjectSeed {
        title: "Student Management System",
        description: "A complete student management system with CRUD operations, grade tracking, and reporting features built with Java and Spring Boot.",
        image_text: "Student+Management+System",
        technologies: ["Java", "Spring Boot", "Data JPA", "MySQL", "Thymeleaf"],
        demo_url: "https://your-student-system.herokuapp.com",
        code_url: "https://github.com/yourusername/student-management",
        featured: false,
        category: "Backend",
        stars: 28,
        views: "650",
    },
    ProjectSeed {
        title: "Password Generator",
        description: "A secure password generator with customizable options, strength indicators, and copy-to-clipboard functionality.",
        image_text: "Password+Generator",
        technologies: ["JavaScript", "HTML5", "CSS3", "Web APIs", "Crypto"],
        demo_url: "https://yourusername.github.io/password-generator",
        code_url: "https://github.com/yourusername/password-generator",
        featured: false,
        category: "Frontend",
        stars: 19,
        views: "420",
    },
    ProjectSeed {
        title: "Courier Management System (v0 based)",
        description: "A modern courier tracking and management system built using v0.dev with real-time tracking and delivery management.",
        image_text: "Courier+Management",
        technologies: ["Next.js", "React", "Tailwind CSS", "Supabase", "v0.dev"],
        demo_url: "https://your-courier-app.vercel.app",
        code_url: "https://github.com/yourusername/courier-management",
        featured: true,
        category: "Full Stack",
        stars: 38,
        views: "980",
    },
];

pub fn projects() -> Vec<Project> {
    PROJECTS
        .iter()
        .enumerate()
        .map(|(i, seed)| Project {
            id: (i + 1).to_string(),
            title: seed.title.into(),
            description: seed.description.into(),
            image: format!("/placeholder.svg?height=400&width=600&text={}", seed.image_text),
            technologies: seed.technologies.iter().map(|t| t.to_string()).collect(),
            demo_url: seed.demo_url.into(),
            code_url: seed.code_url.into(),
            featured: seed.featured,
            category: seed.category.into(),
            stats: ProjectStats {
                stars: seed.stars,
                views: seed.views.into(),
            },
        })
        .collect()
}

pub fn contact() -> ContactInfo {
    ContactInfo {
        email: "krishnadesh2001@gmail.com".into(),
        phone: "+91 98765 43210".into(),
        location: "Mumbai, India".into(),
        github: "https://github.com/krishnadeshmukh".into(),
        linkedin: "https://linkedin.com/in/krishnadeshmukh".into(),
        github_username: "@krishnadeshmukh".into(),
        linkedin_name: "Krishna Deshmukh".into(),
    }
}

pub fn cv() -> Cv {
    Cv {
        file: None,
        url: String::new(),
        button_text: "Download Resume".into(),
        show_in_hero: true,
        show_in_contact: true,
    }
}

pub fn stats() -> Vec<Stat> {
    [
        ("5+", "Projects Built", "trophy", "from-yellow-400 to-orange-400"),
        ("Fresher", "Experience Level", "target", "from-green-400 to-emerald-400"),
        ("Open", "To Opportunities", "users", "from-blue-400 to-cyan-400"),
        ("100%", "Dedication", "zap", "from-purple-400 to-pink-400"),
    ]
    .into_iter()
    .map(|(value, label, icon, color)| Stat {
        value: value.into(),
        label: label.into(),
        icon: icon.into(),
        color: color.into(),
    })
    .collect()
}

pub fn highlights() -> Vec<Highlight> {
    [
        ("trophy", "Problem Solving", "Strong analytical and debugging skills"),
        ("target", "Adaptability", "Quick to learn new technologies"),
        ("zap", "Goal Oriented", "Focused on delivering quality solutions"),
        ("users", "Continuous Learning", "Always expanding my knowledge base"),
    ]
    .into_iter()
    .map(|(icon, title, description)| Highlight {
        icon: icon.into(),
        title: title.into(),
        description: description.into(),
    })
    .collect()
}

pub fn journey() -> Vec<JourneyStep> {
    [
        ("Learning Phase", "Mastered Java fundamentals and OOP concepts", "📚"),
        ("Framework Exploration", "Dove deep into Spring Boot and React", "🔧"),
        ("Project Building", "Created full-stack applications", "🚀"),
        ("Ready for Industry", "Seeking opportunities to apply my skills", "💼"),
    ]
    .into_iter()
    .map(|(phase, description, icon)| JourneyStep {
        phase: phase.into(),
        description: description.into(),
        icon: icon.into(),
    })
    .collect()
}
